//! Terminal game client: frames come from image files on disk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use services::{CaptureError, Frame, FrameSource, GameError, GameLoopService, GameSession, SaveStatus};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Cycles through the image files of a directory in name order.
pub struct DirectoryFrames {
    files: Vec<PathBuf>,
    cursor: AtomicUsize,
}

impl DirectoryFrames {
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be listed.
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| mime_for(path).is_some())
            .collect();
        files.sort();
        Ok(Self {
            files,
            cursor: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[async_trait]
impl FrameSource for DirectoryFrames {
    async fn next_frame(&self) -> Result<Frame, CaptureError> {
        if self.is_empty() {
            return Err(CaptureError::NoFrame("frame directory has no images".into()));
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.files.len();
        let path = &self.files[index];
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CaptureError::NoFrame(format!("{}: {e}", path.display())))?;
        let mime = mime_for(path).unwrap_or("image/jpeg");
        Ok(Frame::new(bytes, mime))
    }
}

//
// ─── TERMINAL LOOP ─────────────────────────────────────────────────────────────
//

const HELP: &str = "commands: [c]apture  [k] check  [n]ext  [r]etry save  [q]uit";

fn render(session: &GameSession) {
    let question = session.question();
    println!();
    println!(
        "Question: {} = ?   answer so far: [{}] ({} digit(s) left)",
        question,
        session.accumulated_answer(),
        session.remaining_digits()
    );
    if let Some(feedback) = session.feedback() {
        println!("{feedback}");
    }
    let stats = session.stats();
    println!(
        "correct {}  incorrect {}  score {}  saved {}  unsaved {}",
        stats.correct, stats.incorrect, stats.score, stats.saved, stats.failed
    );
}

/// Read commands from stdin until `q` or end of input.
///
/// # Errors
///
/// Returns an I/O error if stdin cannot be read.
pub async fn run(game: &GameLoopService) -> std::io::Result<()> {
    let mut session = game.start();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");
    render(&session);

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "c" | "capture" => {
                if let Err(err) = game.capture(&mut session).await {
                    report(&err);
                }
            }
            "k" | "check" => match game.check_answer(&mut session).await {
                Ok(outcome) => {
                    if let SaveStatus::Failed(reason) = outcome.save {
                        println!("result not saved ({reason}); press r to retry");
                    }
                }
                Err(err) => report(&err),
            },
            "n" | "next" => game.next_question(&mut session),
            "r" | "retry" => match game.retry_save(&mut session).await {
                Ok(id) => println!("result saved as #{id}"),
                Err(err) => report(&err),
            },
            "q" | "quit" => break,
            "" => continue,
            _ => println!("{HELP}"),
        }
        render(&session);
    }
    Ok(())
}

fn report(err: &GameError) {
    match err {
        GameError::Capture(_) => {}
        other => println!("{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("signplay-frames-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn cycles_images_in_name_order() {
        let dir = scratch_dir("cycle");
        std::fs::write(dir.join("b.png"), [2]).unwrap();
        std::fs::write(dir.join("a.JPG"), [1]).unwrap();
        std::fs::write(dir.join("notes.txt"), b"skip").unwrap();

        let frames = DirectoryFrames::open(&dir).unwrap();
        assert_eq!(frames.len(), 2);

        let first = frames.next_frame().await.unwrap();
        assert_eq!(first.bytes(), &[1]);
        assert_eq!(first.mime(), "image/jpeg");
        let second = frames.next_frame().await.unwrap();
        assert_eq!(second.mime(), "image/png");
        assert_eq!(frames.next_frame().await.unwrap(), first);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn empty_directory_yields_no_frame() {
        let dir = scratch_dir("empty");
        let frames = DirectoryFrames::open(&dir).unwrap();
        assert!(matches!(
            frames.next_frame().await,
            Err(CaptureError::NoFrame(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
