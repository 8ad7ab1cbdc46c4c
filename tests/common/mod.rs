#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use speccify::Dataclass;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Dataclass)]
pub struct MyQueryData {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Dataclass)]
pub struct MyResponse {
    pub length: usize,
}

pub mod log_capture {
    use std::fmt::Debug;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    /// Records the level and message of every event seen while installed.
    #[derive(Clone, Default)]
    pub struct CapturedLogs {
        events: Arc<Mutex<Vec<(Level, String)>>>,
    }

    impl CapturedLogs {
        pub fn has(&self, level: Level, message: &str) -> bool {
            self.events
                .lock()
                .unwrap()
                .iter()
                .any(|(l, m)| *l == level && m == message)
        }
    }

    struct MessageVisitor(Option<String>);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
            if field.name() == "message" {
                self.0 = Some(format!("{value:?}"));
            }
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "message" {
                self.0 = Some(value.to_string());
            }
        }
    }

    impl<S: Subscriber> Layer<S> for CapturedLogs {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageVisitor(None);
            event.record(&mut visitor);
            if let Some(message) = visitor.0 {
                self.events
                    .lock()
                    .unwrap()
                    .push((*event.metadata().level(), message));
            }
        }
    }

    /// Run `f` with a thread-local subscriber capturing its events.
    pub fn capture<R>(f: impl FnOnce() -> R) -> (R, CapturedLogs) {
        let logs = CapturedLogs::default();
        let subscriber = Registry::default().with(logs.clone());
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, logs)
    }
}
