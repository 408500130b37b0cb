pub mod dialogue_assembler;
pub mod dialogue_session;

pub use dialogue_assembler::{AssemblerSettings, DialogueAssembler, PipelineState};
pub use dialogue_session::DialogueSession;
