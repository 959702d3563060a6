use std::path::Path;

use anyhow::Result;

use leadsheet_domain::{AttemptStatus, InferenceOptions};

/// One invocation of the inference tool.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    /// Directory the tool writes its files into.
    pub output_dir: &'a Path,
    pub audio: &'a str,
    pub options: &'a InferenceOptions,
}

/// Something that turns audio into leadsheet files on disk.
///
/// `Ok(AttemptStatus::Failed { .. })` means the tool ran and reported
/// failure. An `Err` means it could not be run at all; the runner treats both
/// as a failed attempt.
pub trait InferenceTool {
    fn run(&self, request: &InferenceRequest<'_>) -> Result<AttemptStatus>;
}

impl<T: InferenceTool + ?Sized> InferenceTool for &T {
    fn run(&self, request: &InferenceRequest<'_>) -> Result<AttemptStatus> {
        (**self).run(request)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;

    use anyhow::anyhow;

    use super::*;

    /// What a scripted call does before returning.
    pub(crate) enum Step {
        /// Write the files, then succeed.
        Write(Vec<(&'static str, Vec<u8>)>),
        /// Write the files, then exit with the given code.
        FailAfterWriting(Vec<(&'static str, Vec<u8>)>, i32),
        Fail(i32),
        SpawnError,
    }

    /// Records each call and plays back one step per call.
    pub(crate) struct ScriptedTool {
        steps: RefCell<VecDeque<Step>>,
        calls: RefCell<Vec<Option<u8>>>,
    }

    impl ScriptedTool {
        pub(crate) fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: RefCell::new(steps.into()),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn chunk_overrides(&self) -> Vec<Option<u8>> {
            self.calls.borrow().clone()
        }
    }

    pub(crate) fn file(name: &'static str, bytes: &[u8]) -> (&'static str, Vec<u8>) {
        (name, bytes.to_vec())
    }

    fn write_all(dir: &Path, files: &[(&str, Vec<u8>)]) -> Result<()> {
        for (name, bytes) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, bytes)?;
        }
        Ok(())
    }

    impl InferenceTool for ScriptedTool {
        fn run(&self, request: &InferenceRequest<'_>) -> Result<AttemptStatus> {
            assert!(request.output_dir.is_dir(), "scratch dir must exist");
            self.calls
                .borrow_mut()
                .push(request.options.measures_per_chunk);
            let step = self
                .steps
                .borrow_mut()
                .pop_front()
                .expect("tool called more often than scripted");
            match step {
                Step::Write(files) => {
                    write_all(request.output_dir, &files)?;
                    Ok(AttemptStatus::Succeeded)
                }
                Step::FailAfterWriting(files, code) => {
                    write_all(request.output_dir, &files)?;
                    Ok(AttemptStatus::Failed { code: Some(code) })
                }
                Step::Fail(code) => Ok(AttemptStatus::Failed { code: Some(code) }),
                Step::SpawnError => Err(anyhow!("python: command not found")),
            }
        }
    }
}
