pub mod ast;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod element;
pub mod error;
pub mod index;
pub mod report;
pub mod resolver;
pub mod syntax;
pub mod vfs;

pub use config::AnalysisSettings;
pub use context::{AnalysisContext, AnalysisScheduler, ChangeResult, ChangeSet, InstrumentedAnalysisContext};
pub use element::{ContextId, Element, ElementKind, ElementLocation, ElementLookup};
pub use error::{AnalysisError, ConfigError, IndexError, ScanError};
pub use index::{Location, MemoryIndexStore, Relationship};
pub use resolver::{ElementResolver, ResolvedUnit};
pub use syntax::{Edit, SourceKind, TokenStream, rescan};
pub use vfs::{Source, SourceFactory};
