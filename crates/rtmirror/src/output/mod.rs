//! Text and JSON rendering of cache events.
//!
//! [`dump`] writes one record per call, either as a line in the style of
//! `ip monitor` or as a single JSON object:
//!
//! ```ignore
//! use rtmirror::output::{DumpParams, dump};
//!
//! let params = DumpParams::default();
//! dump(&mut std::io::stdout(), Some(Action::New), &link, &params)?;
//! // NEW link 2: eth0 UP mtu 1500
//! ```

mod printable;

use std::io::{self, Write};

use serde::Serialize;

use crate::object::Action;

/// How much to print per object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DumpStyle {
    /// One line per object.
    #[default]
    Line,
    /// The summary line followed by indented detail lines.
    Details,
}

/// Output parameters for [`dump`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpParams {
    pub style: DumpStyle,
    /// Emit one JSON object per record instead of text.
    pub json: bool,
}

impl DumpParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: DumpStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Types that can be printed as cache events.
pub trait Printable: Serialize {
    /// Short name of the record kind ("link", "route", ...).
    fn kind(&self) -> &'static str;

    /// Print the one-line summary, without a trailing newline.
    fn print_line<W: Write>(&self, w: &mut W) -> io::Result<()>;

    /// Print extra lines after the summary. Each line is indented and
    /// newline-terminated.
    fn print_details<W: Write>(&self, _w: &mut W) -> io::Result<()> {
        Ok(())
    }
}

/// Write one record for `object`, prefixed by `action` when there is one.
pub fn dump<W, P>(w: &mut W, action: Option<Action>, object: &P, params: &DumpParams) -> io::Result<()>
where
    W: Write,
    P: Printable,
{
    if params.json {
        let mut record = serde_json::json!({
            "event": object.kind(),
            "object": object,
        });
        if let Some(action) = action {
            record["action"] = serde_json::to_value(action)?;
        }
        serde_json::to_writer(&mut *w, &record)?;
        writeln!(w)?;
        return w.flush();
    }

    if let Some(action) = action {
        write!(w, "{} ", action)?;
    }
    object.print_line(w)?;
    writeln!(w)?;
    if params.style == DumpStyle::Details {
        object.print_details(w)?;
    }
    w.flush()
}
