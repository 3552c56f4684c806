// Diagnostic reporting
//
//  Copyright (C) 2014-2023 Ryan Specialty, LLC.
//
//  This file is part of TAME.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Non-fatal diagnostics produced while linking.
//!
//! Some problems do not prevent a container from being used,
//!   but should still be brought to the attention of the user;
//!     an import that cannot be resolved,
//!     or an import that resolves to an object of a different class than
//!       was recorded when it was saved,
//!   are two examples.
//! The linker reports such problems to a [`Diagnostics`] sink provided by
//!   the host rather than deciding itself how they should be presented.
//!
//!   - [`LogDiagnostics`] forwards each diagnostic to the [`log`] facade;
//!       and
//!   - [`CollectDiagnostics`] retains diagnostics for later inspection.

use log::{error, info, warn};
use std::fmt::{self, Display};

/// Diagnostic severity level.
///
/// Lower levels are more severe
///   (e.g. level 1 is the worst).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
#[repr(u8)]
pub enum Level {
    /// A problem that prevents an object from being used.
    #[default]
    Error = 1,

    /// A problem that the linker was able to work around.
    Warning,

    /// Useful information that supplements other messages.
    Note,
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// A single reported diagnostic.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

/// Sink for non-fatal diagnostics.
pub trait Diagnostics {
    fn report(&mut self, level: Level, message: String);

    fn warn(&mut self, message: String) {
        self.report(Level::Warning, message)
    }
}

impl<D: Diagnostics> Diagnostics for &mut D {
    fn report(&mut self, level: Level, message: String) {
        (**self).report(level, message)
    }
}

/// Forward diagnostics to the [`log`] facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&mut self, level: Level, message: String) {
        match level {
            Level::Error => error!("{message}"),
            Level::Warning => warn!("{message}"),
            Level::Note => info!("{message}"),
        }
    }
}

/// Retain diagnostics in the order in which they were reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectDiagnostics(Vec<Diagnostic>);

impl CollectDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take all diagnostics reported thus far.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.0)
    }
}

impl Diagnostics for CollectDiagnostics {
    fn report(&mut self, level: Level, message: String) {
        self.0.push(Diagnostic { level, message })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn levels_order_by_severity() {
        assert!(Level::Error < Level::Warning);
        assert!(Level::Warning < Level::Note);
    }

    #[test]
    fn collects_in_order() {
        let mut sut = CollectDiagnostics::new();

        sut.warn("first".into());
        sut.report(Level::Error, "second".into());

        assert_eq!(
            vec![
                Diagnostic {
                    level: Level::Warning,
                    message: "first".into()
                },
                Diagnostic {
                    level: Level::Error,
                    message: "second".into()
                },
            ],
            sut.take()
        );

        assert!(sut.is_empty());
    }

    #[test]
    fn reports_through_mutable_reference() {
        let mut sut = CollectDiagnostics::new();

        fn report_to<D: Diagnostics>(mut diag: D) {
            diag.warn("via ref".into());
        }

        report_to(&mut sut);
        assert_eq!("warning: via ref", sut.diagnostics()[0].to_string());
    }
}
