//! Destinations for run progress and the final results document.

use super::value::UiValue;
use crate::errors::{IoResultExt, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A display that can patch one element at a time or take a whole new
/// document.
pub trait ResultsSurface {
    fn set_property(&mut self, element_id: &str, property: &str, value: &UiValue) -> Result<()>;

    fn replace_document(&mut self, html: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum SurfaceEvent<'a> {
    Set {
        id: &'a str,
        property: &'a str,
        value: &'a UiValue,
    },
    Replace {
        html: &'a str,
    },
}

/// Writes one JSON event per line, for a viewer on the other end of a pipe.
pub struct JsonLinesSurface<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSurface<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, event: &SurfaceEvent<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> ResultsSurface for JsonLinesSurface<W> {
    fn set_property(&mut self, element_id: &str, property: &str, value: &UiValue) -> Result<()> {
        self.emit(&SurfaceEvent::Set {
            id: element_id,
            property,
            value,
        })
    }

    fn replace_document(&mut self, html: &str) -> Result<()> {
        self.emit(&SurfaceEvent::Replace { html })
    }
}

/// Static HTML file. Property updates have nowhere to go and are dropped.
#[derive(Debug, Clone)]
pub struct HtmlFileSurface {
    path: PathBuf,
}

impl HtmlFileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultsSurface for HtmlFileSurface {
    fn set_property(&mut self, element_id: &str, property: &str, _value: &UiValue) -> Result<()> {
        log::trace!("Ignoring live update {}.{} for static page", element_id, property);
        Ok(())
    }

    fn replace_document(&mut self, html: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_path("Failed to create output directory", parent)?;
        }
        fs::write(&self.path, html).with_path("Failed to write results page", &self.path)?;
        log::info!("Results page written to {}", self.path.display());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    Set {
        id: String,
        property: String,
        value: UiValue,
    },
    Replace(String),
}

/// Records every call.
#[derive(Debug, Default)]
pub struct MemorySurface {
    pub calls: Vec<SurfaceCall>,
}

impl MemorySurface {
    /// Last value set for `id.property`
    pub fn property(&self, id: &str, property: &str) -> Option<&UiValue> {
        self.calls.iter().rev().find_map(|call| match call {
            SurfaceCall::Set {
                id: i,
                property: p,
                value,
            } if i == id && p == property => Some(value),
            _ => None,
        })
    }

    pub fn document(&self) -> Option<&str> {
        self.calls.iter().rev().find_map(|call| match call {
            SurfaceCall::Replace(html) => Some(html.as_str()),
            _ => None,
        })
    }
}

impl ResultsSurface for MemorySurface {
    fn set_property(&mut self, element_id: &str, property: &str, value: &UiValue) -> Result<()> {
        self.calls.push(SurfaceCall::Set {
            id: element_id.to_string(),
            property: property.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn replace_document(&mut self, html: &str) -> Result<()> {
        self.calls.push(SurfaceCall::Replace(html.to_string()));
        Ok(())
    }
}
