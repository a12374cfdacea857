use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use vistoria_core::{Photo, PhotoRef};

use super::Session;

#[derive(Debug, clap::Subcommand)]
pub enum Preventive {
    /// Record a preventive maintenance event
    Add(Add),

    /// List recorded events, newest maintenance date first
    List(List),
}

impl Preventive {
    pub(super) fn run(self, session: &Session) -> anyhow::Result<()> {
        match self {
            Self::Add(command) => command.run(session),
            Self::List(command) => command.run(session),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// Equipment as "<SECTION> - <Item>"
    #[arg(long)]
    equipment: String,

    /// Maintenance date as YYYY-MM-DD
    #[arg(long)]
    date: NaiveDate,

    /// Photo file, or an http(s) URL of a photo stored elsewhere
    #[arg(long)]
    photo: String,
}

impl Add {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let photo = load_photo(&self.photo)?;
        let mut engine = session.signed_in()?;
        let record = engine.record_preventive(&self.equipment, self.date, photo)?;
        println!(
            "Recorded maintenance of {} on {} by {}",
            record.equipment,
            record.date.format("%d/%m/%Y"),
            record.collaborator
        );
        Ok(())
    }
}

fn load_photo(source: &str) -> anyhow::Result<Photo> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return Ok(Photo::External(source.to_string()));
    }
    let path = PathBuf::from(source);
    let bytes =
        std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Photo::Inline {
        content_type: content_type(&path).to_string(),
        bytes,
    })
}

fn content_type(path: &std::path::Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, clap::Parser)]
pub struct List {
    /// Case-insensitive match on equipment or collaborator
    #[arg(long)]
    filter: Option<String>,
}

impl List {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let engine = session.guest()?;
        let records = engine.preventives(self.filter.as_deref())?;
        if records.is_empty() {
            println!("No preventive maintenance recorded");
            return Ok(());
        }
        for record in records {
            let photo = match &record.photo {
                PhotoRef::Blob { hash, .. } => format!("photo {hash}"),
                PhotoRef::External(url) => url.clone(),
            };
            println!(
                "{}  {}  {}  {photo}",
                record.date.format("%d/%m/%Y"),
                record.equipment,
                record.collaborator
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_external() {
        let photo = load_photo("https://fotos.example/1.jpg").unwrap();
        assert_eq!(photo, Photo::External("https://fotos.example/1.jpg".into()));
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type(std::path::Path::new("a/B.JPG")), "image/jpeg");
        assert_eq!(content_type(std::path::Path::new("x.png")), "image/png");
        assert_eq!(content_type(std::path::Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_photo("/definitely/not/here.jpg").is_err());
    }
}
