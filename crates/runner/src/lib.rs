pub mod collect;
pub mod command;
pub mod pipeline;
pub mod tool;

pub use collect::collect_outputs;
pub use command::SheetSageCommand;
pub use pipeline::ExtractionPipeline;
pub use tool::{InferenceRequest, InferenceTool};
