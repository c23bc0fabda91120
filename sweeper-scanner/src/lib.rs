pub mod audit;
pub mod config;
pub mod crawler;
pub mod error;
pub mod events;
pub mod fetch;
mod html;
pub mod localize;
pub mod model;
pub mod naming;
pub mod persist;
pub mod result;
pub mod rewrite;
pub mod scope;

pub use audit::LinkAuditor;
pub use config::SweepConfig;
pub use crawler::Sweeper;
pub use error::{FetchError, RenderError, SweepError};
pub use events::{EventSink, SweepEvent};
pub use persist::OutputTree;
pub use result::{AuditReport, CrawlResult, MirrorOutcome, SweepOutcome};
