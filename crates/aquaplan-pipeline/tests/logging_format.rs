mod support;

use std::io;
use std::sync::{Arc, Mutex};

use aquaplan_pipeline::Pipeline;
use support::*;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn stage_events_are_structured_json() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .json()
        .with_max_level(Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let pipeline = Pipeline::new(config(false), Arc::new(fake_backend()));
    pipeline
        .confirm_selection(three_village_scope())
        .await
        .expect("confirm");
    pipeline.save_wells_dataset(wells()).await.expect("wells");
    pipeline.compute_recharge().await.expect("recharge");

    let bytes = sink.0.lock().expect("lock output").clone();
    let text = String::from_utf8(bytes).expect("utf8 log output");
    let events: Vec<serde_json::Value> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("json log line"))
        .collect();
    let computed = events
        .iter()
        .find(|e| e["fields"]["message"] == "stage computed")
        .expect("stage computed event");
    assert_eq!(computed["level"], "INFO");
    assert_eq!(computed["fields"]["stage"], "recharge");
    assert_eq!(computed["fields"]["rows"], 3);
    assert!(events
        .iter()
        .any(|e| e["fields"]["message"] == "selection confirmed"));
}
