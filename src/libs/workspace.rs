use std::path::{Path, PathBuf};

/// Private scratch directory of one run.
///
/// Every task gets its own job and output file. Released tasks lose their
/// files right away; whatever is left goes with the directory on drop, on
/// success and on every error path alike.
pub struct Workspace {
    dir: tempfile::TempDir,
    width: usize,
}

impl Workspace {
    /// Creates the directory under `parent`, or the system temp dir.
    /// `task_count` only fixes the width of the file numbers.
    pub fn new(parent: Option<&Path>, task_count: usize) -> anyhow::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("chainmsa.");
        let dir = match parent {
            Some(p) => {
                std::fs::create_dir_all(p)?;
                builder.tempdir_in(p)?
            }
            None => builder.tempdir()?,
        };
        log::debug!(
            "Workspace {} for {} tasks",
            dir.path().display(),
            task_count
        );

        Ok(Self {
            dir,
            width: task_count.max(1).to_string().len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Input file of task `task`.
    pub fn job_path(&self, task: usize) -> PathBuf {
        self.dir
            .path()
            .join(format!("block_{:0w$}.fa", task, w = self.width))
    }

    /// Where the aligner leaves the result of task `task`.
    pub fn output_path(&self, task: usize) -> PathBuf {
        self.dir
            .path()
            .join(format!("block_{:0w$}.aln.fa", task, w = self.width))
    }

    /// Deletes the files of task `task`; missing files are fine.
    pub fn release(&self, task: usize) -> std::io::Result<()> {
        for path in [self.job_path(task), self.output_path(task)] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_unique() {
        let ws = Workspace::new(None, 120).unwrap();
        assert!(ws.job_path(7).ends_with("block_007.fa"));
        assert!(ws.output_path(7).ends_with("block_007.aln.fa"));
        assert_ne!(ws.job_path(7), ws.job_path(70));
        assert_ne!(ws.job_path(7), ws.output_path(7));
    }

    #[test]
    fn test_release_is_idempotent() {
        let ws = Workspace::new(None, 3).unwrap();
        std::fs::write(ws.job_path(1), ">a\nACGT\n").unwrap();
        std::fs::write(ws.job_path(2), ">a\nACGT\n").unwrap();

        ws.release(1).unwrap();
        ws.release(1).unwrap();
        assert!(!ws.job_path(1).exists());
        assert!(ws.job_path(2).exists());
    }

    #[test]
    fn test_dropped_on_scope_exit() {
        let parent = tempfile::tempdir().unwrap();
        let path = {
            let ws = Workspace::new(Some(parent.path()), 2).unwrap();
            std::fs::write(ws.job_path(0), ">a\nA\n").unwrap();
            ws.path().to_path_buf()
        };
        assert!(path.starts_with(parent.path()));
        assert!(!path.exists());
    }
}
