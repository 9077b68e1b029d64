//! Save and restore sequencing over an operator interface.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use dirsnap_codec::Format;
use dirsnap_core::{Result, Snapshot, SnapshotConfig, SnapshotError};
use dirsnap_scan::{Summarizer, TreeWalker};

use crate::persist::{
    default_document_name, ensure_json_extension, find_default_document, read_snapshot,
    write_snapshot,
};
use crate::restore::{RestoreLayout, RestoreReport, Restorer};

/// Confirmation question asked before any write.
pub const PROCEED_PROMPT: &str = "Do you want to proceed? (y/n) [default: y]: ";

const COMMAND_PROMPT: &str = "Enter command (save [s] / restore [r]) [default: save]: ";
const SOURCE_PROMPT: &str = "Enter source directory path: ";
const SAVE_DOCUMENT_PROMPT: &str =
    "Enter destination JSON file path to save (leave empty to use default): ";
const REMARK_PROMPT: &str = "Enter a remark: ";
const RESTORE_DOCUMENT_PROMPT: &str =
    "Enter JSON file path to restore from (leave empty to use first JSON file in current directory): ";
const DESTINATION_PROMPT: &str = "Enter destination directory path to restore to: ";

/// The person (or script) driving a session.
pub trait Operator {
    /// Ask a question and return the raw answer.
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Report a status line.
    fn status(&mut self, line: &str);
}

/// Whether an answer to [`PROCEED_PROMPT`] means yes.
///
/// Only `n` and `no` decline; an empty answer accepts.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_ascii_lowercase();
    answer != "n" && answer != "no"
}

/// Result of an operation the operator may decline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}

/// Parameters of a save.
#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    /// Directory to capture.
    pub source: PathBuf,
    /// Document to write; a default name is generated when `None`.
    pub document: Option<PathBuf>,
    pub remark: String,
}

/// Parameters of a restore.
#[derive(Debug, Clone, Default)]
pub struct RestoreRequest {
    /// Document to read; the first document in the document directory is
    /// used when `None`.
    pub document: Option<PathBuf>,
    pub destination: PathBuf,
}

/// Behaviour switches for a [`Session`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Skip the confirmation question.
    pub assume_yes: bool,
    pub layout: RestoreLayout,
    pub format: Format,
    /// Where default documents are written and looked up. The current
    /// directory when `None`.
    pub document_dir: Option<PathBuf>,
}

/// Drives save, restore and inspect operations, asking the operator for
/// confirmation before anything is written.
///
/// Failures are returned to the caller and never echoed through
/// [`Operator::status`].
pub struct Session<O> {
    operator: O,
    walker: TreeWalker,
    summarizer: Summarizer,
    restorer: Restorer,
    options: SessionOptions,
}

impl<O: Operator> Session<O> {
    /// Create a session with the default exclusions and binary policy.
    pub fn new(operator: O, options: SessionOptions) -> Self {
        Self::with_config(operator, &SnapshotConfig::default(), options)
    }

    /// Create a session whose walks and restores follow `config`.
    pub fn with_config(operator: O, config: &SnapshotConfig, options: SessionOptions) -> Self {
        Self {
            operator,
            walker: TreeWalker::with_config(config),
            summarizer: Summarizer::with_config(config),
            restorer: Restorer::new().with_filter(config.filter()),
            options,
        }
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    pub fn into_operator(self) -> O {
        self.operator
    }

    /// Capture `request.source` and write it to a document.
    ///
    /// Returns the document path, or `Cancelled` when the operator declines.
    /// Nothing is written before the confirmation.
    pub fn save(&mut self, request: SaveRequest) -> Result<Outcome<PathBuf>> {
        let source = request
            .source
            .canonicalize()
            .map_err(|e| SnapshotError::io(&request.source, e))?;

        let root = self.walker.capture(&source)?;
        let summary = self.summarizer.summarize(&source)?;
        if !summary.matches(&root) {
            warn!(
                files = summary.total_files,
                directories = summary.total_directories,
                "directory changed while it was being captured"
            );
        }

        let document = match request.document {
            Some(path) => ensure_json_extension(path),
            None => self
                .document_dir()
                .join(default_document_name(&source, Utc::now())),
        };

        self.operator.status(&format!("Summary for {}:", root.name));
        self.operator
            .status(&format!("- Last saved: {}", summary.saved_at));
        self.operator
            .status(&format!("- Total files: {}", summary.total_files));
        self.operator
            .status(&format!("- Total directories: {}", summary.total_directories));
        self.operator.status(&format!(
            "- Content size: {}",
            humansize::format_size(root.content_bytes(), humansize::BINARY)
        ));
        self.operator
            .status(&format!("Source directory: {}", source.display()));
        self.operator
            .status(&format!("Destination document: {}", document.display()));

        if !self.confirm()? {
            self.operator.status("Operation cancelled.");
            return Ok(Outcome::Cancelled);
        }

        let snapshot = Snapshot::new(root, &source, request.remark, summary)?;
        write_snapshot(&snapshot, &document, self.options.format)?;

        info!(document = %document.display(), "snapshot saved");
        self.operator.status(&format!(
            "Directory structure saved to {}",
            document.display()
        ));
        Ok(Outcome::Completed(document))
    }

    /// Restore a document into `request.destination`.
    ///
    /// The document is fully decoded and validated before the operator is
    /// asked; the destination is untouched until then.
    pub fn restore(&mut self, request: RestoreRequest) -> Result<Outcome<RestoreReport>> {
        let document = self.resolve_document(request.document)?;
        let snapshot = read_snapshot(&document)?;

        self.report_snapshot(&snapshot, &document);
        self.operator.status(&format!(
            "Destination directory: {}",
            request.destination.display()
        ));

        if !self.confirm()? {
            self.operator.status("Operation cancelled.");
            return Ok(Outcome::Cancelled);
        }

        let report =
            self.restorer
                .restore_snapshot(&snapshot, &request.destination, self.options.layout)?;

        info!(
            destination = %request.destination.display(),
            files = report.files,
            directories = report.directories,
            "snapshot restored"
        );
        self.operator.status(&format!(
            "Directory structure restored to {}",
            request.destination.display()
        ));
        self.operator.status(&report.summary());
        Ok(Outcome::Completed(report))
    }

    /// Decode a document and report its summary without restoring it.
    pub fn inspect(&mut self, document: Option<PathBuf>) -> Result<Snapshot> {
        let document = self.resolve_document(document)?;
        let snapshot = read_snapshot(&document)?;
        self.report_snapshot(&snapshot, &document);
        Ok(snapshot)
    }

    /// Ask for the command and its parameters, then run it.
    pub fn interactive(&mut self) -> Result<Outcome<()>> {
        let command = self.operator.ask(COMMAND_PROMPT)?;
        let command = command.trim().to_ascii_lowercase();

        if command == "restore" || command == "r" {
            let document = self.operator.ask(RESTORE_DOCUMENT_PROMPT)?;
            let destination = self.operator.ask(DESTINATION_PROMPT)?;
            let request = RestoreRequest {
                document: non_empty(&document).map(PathBuf::from),
                destination: path_or_current(&destination),
            };
            return Ok(self.restore(request)?.map(|_| ()));
        }

        if !command.is_empty() && command != "save" && command != "s" {
            warn!(command = %command, "unknown command, saving");
        }

        let source = self.operator.ask(SOURCE_PROMPT)?;
        let document = self.operator.ask(SAVE_DOCUMENT_PROMPT)?;
        let remark = self.operator.ask(REMARK_PROMPT)?;
        let request = SaveRequest {
            source: path_or_current(&source),
            document: non_empty(&document).map(PathBuf::from),
            remark: remark.trim().to_string(),
        };
        Ok(self.save(request)?.map(|_| ()))
    }

    fn confirm(&mut self) -> Result<bool> {
        if self.options.assume_yes {
            return Ok(true);
        }
        let answer = self.operator.ask(PROCEED_PROMPT)?;
        Ok(is_affirmative(&answer))
    }

    fn document_dir(&self) -> PathBuf {
        self.options
            .document_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn resolve_document(&self, document: Option<PathBuf>) -> Result<PathBuf> {
        match document {
            Some(path) => Ok(path),
            None => find_default_document(&self.document_dir()),
        }
    }

    fn report_snapshot(&mut self, snapshot: &Snapshot, document: &Path) {
        self.operator
            .status(&format!("Summary for {}:", snapshot.name()));
        self.operator
            .status(&format!("- Last saved: {}", snapshot.summary.saved_at));
        self.operator
            .status(&format!("- Total files: {}", snapshot.total_files()));
        self.operator.status(&format!(
            "- Total directories: {}",
            snapshot.total_directories()
        ));
        if !snapshot.remark.is_empty() {
            self.operator
                .status(&format!("- Remark: {}", snapshot.remark));
        }
        self.operator
            .status(&format!("Source JSON file: {}", document.display()));
    }
}

fn non_empty(answer: &str) -> Option<&str> {
    let answer = answer.trim();
    (!answer.is_empty()).then_some(answer)
}

fn path_or_current(answer: &str) -> PathBuf {
    PathBuf::from(non_empty(answer).unwrap_or("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Scripted {
        answers: VecDeque<String>,
        questions: Vec<String>,
        lines: Vec<String>,
    }

    impl Scripted {
        fn answering(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    impl Operator for Scripted {
        fn ask(&mut self, question: &str) -> Result<String> {
            self.questions.push(question.to_string());
            Ok(self.answers.pop_front().unwrap_or_default())
        }

        fn status(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }
    }

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("b")).unwrap();
        fs::write(src.join("a.txt"), "hello").unwrap();
        fs::write(src.join("b/c.txt"), "world").unwrap();
        temp
    }

    fn options(dir: &Path) -> SessionOptions {
        SessionOptions {
            document_dir: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative(""));
        assert!(is_affirmative("y"));
        assert!(is_affirmative(" YES "));
        assert!(is_affirmative("maybe"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("No\n"));
    }

    #[test]
    fn test_outcome_map() {
        assert_eq!(Outcome::Completed(2).map(|n| n * 2), Outcome::Completed(4));
        assert!(Outcome::<u8>::Cancelled.map(|n| n + 1).is_cancelled());
        assert_eq!(Outcome::Completed("x").completed(), Some("x"));
    }

    #[test]
    fn test_save_asks_and_writes() {
        let temp = fixture();
        let mut session = Session::new(Scripted::answering(&[""]), options(temp.path()));
        let document = temp.path().join("snap");

        let outcome = session
            .save(SaveRequest {
                source: temp.path().join("src"),
                document: Some(document),
                remark: "first".to_string(),
            })
            .unwrap();

        let path = outcome.completed().unwrap();
        assert_eq!(path, temp.path().join("snap.json"));
        assert!(path.is_file());

        let operator = session.into_operator();
        assert_eq!(operator.questions, vec![PROCEED_PROMPT.to_string()]);
        assert!(operator.lines.contains(&"- Total files: 2".to_string()));
        assert!(operator.lines.contains(&"- Total directories: 1".to_string()));
    }

    #[test]
    fn test_save_declined_writes_nothing() {
        let temp = fixture();
        let mut session = Session::new(Scripted::answering(&["n"]), options(temp.path()));
        let document = temp.path().join("snap.json");

        let outcome = session
            .save(SaveRequest {
                source: temp.path().join("src"),
                document: Some(document.clone()),
                remark: String::new(),
            })
            .unwrap();

        assert!(outcome.is_cancelled());
        assert!(!document.exists());
        assert_eq!(
            session.operator().lines.last().map(String::as_str),
            Some("Operation cancelled.")
        );
    }

    #[test]
    fn test_save_default_document_name() {
        let temp = fixture();
        let opts = SessionOptions {
            assume_yes: true,
            ..options(temp.path())
        };
        let mut session = Session::new(Scripted::default(), opts);

        let path = session
            .save(SaveRequest {
                source: temp.path().join("src"),
                ..Default::default()
            })
            .unwrap()
            .completed()
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("src_"));
        assert!(name.ends_with("Z.json"));
        assert!(!name.contains(':'));
        assert!(session.operator().questions.is_empty());
    }

    #[test]
    fn test_save_missing_source() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::new(Scripted::default(), options(temp.path()));
        let err = session
            .save(SaveRequest {
                source: temp.path().join("missing"),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, SnapshotError::PathNotFound { .. }));
        assert!(session.operator().questions.is_empty());
        assert!(session.operator().lines.is_empty());
    }

    #[test]
    fn test_failures_are_returned_not_reported() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::new(Scripted::answering(&["r", "", "out"]), options(temp.path()));

        let err = session.interactive().unwrap_err();
        assert!(matches!(err, SnapshotError::AmbiguousDefaultDocument { .. }));
        assert!(session.operator().lines.is_empty());
        assert!(!temp.path().join("out").exists());
    }

    #[test]
    fn test_restore_declined_touches_nothing() {
        let temp = fixture();
        let mut session = Session::new(Scripted::answering(&["y", "no"]), options(temp.path()));
        session
            .save(SaveRequest {
                source: temp.path().join("src"),
                document: Some(temp.path().join("snap.json")),
                remark: String::new(),
            })
            .unwrap();

        let out = temp.path().join("out");
        let outcome = session
            .restore(RestoreRequest {
                document: None,
                destination: out.clone(),
            })
            .unwrap();

        assert!(outcome.is_cancelled());
        assert!(!out.exists());
    }

    #[test]
    fn test_inspect_reports_remark() {
        let temp = fixture();
        let opts = SessionOptions {
            assume_yes: true,
            ..options(temp.path())
        };
        let mut session = Session::new(Scripted::default(), opts);
        let path = session
            .save(SaveRequest {
                source: temp.path().join("src"),
                document: Some(temp.path().join("snap.json")),
                remark: "before refactor".to_string(),
            })
            .unwrap()
            .completed()
            .unwrap();

        let snapshot = session.inspect(Some(path)).unwrap();
        assert_eq!(snapshot.remark, "before refactor");
        assert!(
            session
                .operator()
                .lines
                .contains(&"- Remark: before refactor".to_string())
        );
    }

    #[test]
    fn test_interactive_save_then_restore() {
        let temp = fixture();
        let source = temp.path().join("src");
        let document = temp.path().join("interactive.json");
        let out = temp.path().join("out");

        let answers = [
            "s",
            source.to_str().unwrap(),
            document.to_str().unwrap(),
            "note",
            "",
        ];
        let mut session = Session::new(Scripted::answering(&answers), options(temp.path()));
        assert_eq!(session.interactive().unwrap(), Outcome::Completed(()));
        assert!(document.is_file());

        let answers = ["r", "", out.to_str().unwrap(), "y"];
        let mut session = Session::new(Scripted::answering(&answers), options(temp.path()));
        assert_eq!(session.interactive().unwrap(), Outcome::Completed(()));
        assert_eq!(fs::read_to_string(out.join("b/c.txt")).unwrap(), "world");
    }
}
