pub mod config;
pub mod dialogue;
pub mod error;
pub mod imputation;
pub mod intent;
pub mod message;
pub mod payload;
pub mod prediction;
pub mod report;
pub mod runner;
pub mod schema;
pub mod storage;
pub mod value;

// Re-export commonly used types
pub use config::{AssistantConfig, PredictionApiConfig};
pub use dialogue::{DialogueEngine, DialogueSession, Effect, Event, GREETING, Phase, Transition};
pub use error::{DispatchError, FlowError, Result};
pub use imputation::ImputationTable;
pub use message::{ChatMessage, MessageKind, MessageRole};
pub use payload::{PredictionRequest, build_payload};
pub use prediction::{HttpPredictionClient, PredictionClient, PredictionResult};
pub use report::{Report, format_report};
pub use runner::{FlowRunner, RunnerSettings};
pub use schema::{Domain, DomainSchema, FieldSpec};
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use value::{CollectedData, FieldValue};
