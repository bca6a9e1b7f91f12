//! Read-only study guide chapters, one markdown file per chapter.
//!
//! Each `<slug>.md` starts with a YAML frontmatter block:
//!
//! ```text
//! ---
//! title: 프롬프트 기본 구조
//! chapter: 1
//! description: 좋은 프롬프트의 네 가지 요소
//! ---
//! ```

use std::{
    io,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use ts_rs::TS;
use utils::text::slugify;

/// Characters per minute of Korean reading.
pub const READING_CHARS_PER_MINUTE: usize = 300;

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]+(.+)$").expect("valid heading pattern"));

#[derive(Debug, Error)]
pub enum StudyGuideError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid frontmatter in {slug}: {source}")]
    Frontmatter {
        slug: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct ChapterFrontmatter {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub chapter: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct TableOfContentsItem {
    pub id: String,
    pub title: String,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Chapter {
    pub id: String,
    pub slug: String,
    pub frontmatter: ChapterFrontmatter,
    pub content: String,
    pub reading_time: usize,
    pub table_of_contents: Vec<TableOfContentsItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct AdjacentChapters {
    pub prev: Option<Chapter>,
    pub next: Option<Chapter>,
}

pub fn reading_time(content: &str) -> usize {
    content.chars().count().div_ceil(READING_CHARS_PER_MINUTE)
}

/// Every markdown heading in document order.
pub fn table_of_contents(content: &str) -> Vec<TableOfContentsItem> {
    HEADING
        .captures_iter(content)
        .map(|caps| {
            let title = caps[2].trim().to_string();
            TableOfContentsItem {
                id: slugify(&title),
                level: caps[1].len() as u8,
                title,
            }
        })
        .collect()
}

/// Splits a leading `---` block off the document. Documents without one
/// have no frontmatter.
fn split_frontmatter(raw: &str) -> (Option<&str>, &str) {
    let Some(rest) = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))
    else {
        return (None, raw);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, raw)
}

pub fn parse_chapter(slug: &str, raw: &str) -> Result<Chapter, StudyGuideError> {
    let (yaml, content) = split_frontmatter(raw);
    let frontmatter = match yaml.map(str::trim) {
        Some(yaml) if !yaml.is_empty() => {
            serde_yaml::from_str(yaml).map_err(|source| StudyGuideError::Frontmatter {
                slug: slug.to_string(),
                source,
            })?
        }
        _ => ChapterFrontmatter::default(),
    };

    Ok(Chapter {
        id: slug.to_string(),
        slug: slug.to_string(),
        frontmatter,
        reading_time: reading_time(content),
        table_of_contents: table_of_contents(content),
        content: content.to_string(),
    })
}

fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.contains(['/', '\\']) && !slug.contains("..")
}

#[derive(Debug, Clone)]
pub struct StudyGuide {
    content_dir: PathBuf,
}

impl StudyGuide {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
        }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    async fn read_chapter(&self, slug: &str) -> Result<Option<Chapter>, StudyGuideError> {
        let path = self.content_dir.join(format!("{slug}.md"));
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        parse_chapter(slug, &raw).map(Some)
    }

    /// All chapters ordered by chapter number. Files that cannot be read or
    /// parsed are left out.
    pub async fn list_chapters(&self) -> Vec<Chapter> {
        let mut entries = match tokio::fs::read_dir(&self.content_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, dir = %self.content_dir.display(), "Cannot read study guide directory");
                return Vec::new();
            }
        };

        let mut chapters = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Stopped reading study guide directory");
                    break;
                }
            };
            let file_name = entry.file_name();
            let Some(slug) = file_name.to_str().and_then(|name| name.strip_suffix(".md")) else {
                continue;
            };

            match self.read_chapter(slug).await {
                Ok(Some(chapter)) => chapters.push(chapter),
                Ok(None) => {}
                Err(e) => warn!(error = %e, slug, "Skipping unreadable chapter"),
            }
        }

        chapters.sort_by_key(|chapter| chapter.frontmatter.chapter);
        debug!(count = chapters.len(), "Loaded study guide chapters");
        chapters
    }

    /// The chapter stored as `<slug>.md`. Unsafe slugs, missing files and
    /// unparsable files are all `None`.
    pub async fn get_chapter(&self, slug: &str) -> Option<Chapter> {
        if !is_safe_slug(slug) {
            warn!(slug, "Rejected chapter slug");
            return None;
        }
        match self.read_chapter(slug).await {
            Ok(chapter) => chapter,
            Err(e) => {
                warn!(error = %e, slug, "Failed to load chapter");
                None
            }
        }
    }

    pub async fn adjacent(&self, slug: &str) -> AdjacentChapters {
        let mut chapters = self.list_chapters().await;
        let Some(index) = chapters.iter().position(|c| c.slug == slug) else {
            return AdjacentChapters::default();
        };

        let next = (index + 1 < chapters.len()).then(|| chapters.remove(index + 1));
        let prev = (index > 0).then(|| chapters.remove(index - 1));
        AdjacentChapters { prev, next }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn chapter_file(number: i64, title: &str, body: &str) -> String {
        format!("---\ntitle: {title}\nchapter: {number}\ndescription: 설명\n---\n{body}")
    }

    fn guide() -> (TempDir, StudyGuide) {
        let dir = TempDir::new().unwrap();
        let files = [
            ("basics.md", chapter_file(1, "기초", "# 시작하기\n본문")),
            ("advanced.md", chapter_file(3, "심화", "## 심화 기법\n")),
            ("patterns.md", chapter_file(2, "패턴", "# 패턴\n### 예시: 요약!\n")),
            ("broken.md", "---\ntitle: [unclosed\n---\n본문".to_string()),
            ("notes.txt", "not a chapter".to_string()),
        ];
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        let guide = StudyGuide::new(dir.path());
        (dir, guide)
    }

    #[test]
    fn reading_time_rounds_up_per_300_chars() {
        assert_eq!(reading_time(""), 0);
        assert_eq!(reading_time(&"가".repeat(300)), 1);
        assert_eq!(reading_time(&"가".repeat(301)), 2);
    }

    #[test]
    fn table_of_contents_lists_headings_with_slug_ids() {
        let toc = table_of_contents("# 1장. 소개\n본문 #태그\n### Step 2: 실습  \n####### 너무 깊음\n");
        assert_eq!(
            toc,
            vec![
                TableOfContentsItem {
                    id: "1장-소개".to_string(),
                    title: "1장. 소개".to_string(),
                    level: 1,
                },
                TableOfContentsItem {
                    id: "step-2-실습".to_string(),
                    title: "Step 2: 실습".to_string(),
                    level: 3,
                },
            ]
        );
    }

    #[test]
    fn parse_splits_frontmatter_from_content() {
        let chapter = parse_chapter("basics", &chapter_file(1, "기초", "# 시작하기\n")).unwrap();
        assert_eq!(chapter.id, "basics");
        assert_eq!(chapter.frontmatter.title, "기초");
        assert_eq!(chapter.frontmatter.chapter, 1);
        assert_eq!(chapter.content, "# 시작하기\n");
        assert_eq!(chapter.table_of_contents.len(), 1);
    }

    #[test]
    fn documents_without_frontmatter_keep_all_content() {
        let chapter = parse_chapter("plain", "# 제목\n").unwrap();
        assert_eq!(chapter.frontmatter, ChapterFrontmatter::default());
        assert_eq!(chapter.content, "# 제목\n");
    }

    #[tokio::test]
    async fn list_sorts_by_chapter_and_skips_broken_files() {
        let (_dir, guide) = guide();
        let slugs: Vec<String> = guide
            .list_chapters()
            .await
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert_eq!(slugs, ["basics", "patterns", "advanced"]);
    }

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let guide = StudyGuide::new(dir.path().join("nope"));
        assert!(guide.list_chapters().await.is_empty());
    }

    #[tokio::test]
    async fn get_chapter_rejects_path_traversal() {
        let (dir, guide) = guide();
        fs::write(dir.path().join("..secret.md"), chapter_file(9, "x", "")).unwrap();

        assert!(guide.get_chapter("patterns").await.is_some());
        assert!(guide.get_chapter("missing").await.is_none());
        assert!(guide.get_chapter("broken").await.is_none());
        assert!(guide.get_chapter("../basics").await.is_none());
        assert!(guide.get_chapter("..secret").await.is_none());
        assert!(guide.get_chapter("a\\b").await.is_none());
    }

    #[tokio::test]
    async fn adjacent_follows_chapter_order() {
        let (_dir, guide) = guide();

        let middle = guide.adjacent("patterns").await;
        assert_eq!(middle.prev.map(|c| c.slug).as_deref(), Some("basics"));
        assert_eq!(middle.next.map(|c| c.slug).as_deref(), Some("advanced"));

        let first = guide.adjacent("basics").await;
        assert!(first.prev.is_none());
        assert_eq!(first.next.map(|c| c.slug).as_deref(), Some("patterns"));

        let unknown = guide.adjacent("missing").await;
        assert!(unknown.prev.is_none() && unknown.next.is_none());
    }
}
