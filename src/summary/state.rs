// Container summary state machines
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

//! States for reading and writing a [`Summary`].
//!
//! Each state reads (or writes) one group of fixed-width fields and
//!   transitions by consuming itself,
//!     so that a state can never be observed after it has been left.
//! A host that reads containers incrementally may suspend between any two
//!   states.

use super::{Generation, Guid, Summary, TableInfo};
use crate::error::{LinkError, Result};
use crate::global;
use crate::obj::ContainerFlags;
use crate::stream::{At, ContainerReader};
use byteorder::{LittleEndian, WriteBytesExt};
use log::trace;
use std::fmt::{self, Display};
use std::io::{self, Write};

/// Size of a single heritage GUID on disk.
const HERITAGE_GUID_LEN: u64 = 16;

/// Size of a single generation record on disk.
const GENERATION_LEN: u64 = 8;

/// Summary read state.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ReadState {
    #[default]
    ReadTag,
    ReadVersionAndFlags,
    ReadTableCounts(Summary),
    ReadGenerationInfoOrHeritage(Summary),
    Ready(Summary),
}

impl Display for ReadState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ReadTag => write!(f, "expecting container tag"),
            Self::ReadVersionAndFlags => {
                write!(f, "expecting container version and flags")
            }
            Self::ReadTableCounts(_) => write!(f, "expecting table locations"),
            Self::ReadGenerationInfoOrHeritage(summary) => write!(
                f,
                "expecting {} (version {})",
                if summary.file_version >= global::GENERATIONS_VERSION {
                    "generation history"
                } else {
                    "heritage"
                },
                summary.file_version,
            ),
            Self::Ready(_) => write!(f, "summary complete"),
        }
    }
}

impl ReadState {
    /// Read the fields of this state and transition to the next.
    ///
    /// Reading from [`ReadState::Ready`] yields [`ReadState::Ready`].
    pub fn read_next(self, reader: &mut ContainerReader) -> Result<Self> {
        let next = match self {
            Self::ReadTag => {
                let tag = reader.u32(At::Header, "tag")?;

                if tag != global::CONTAINER_TAG {
                    return Err(LinkError::CorruptHeader {
                        field: "tag",
                        offset: 0,
                    });
                }

                Self::ReadVersionAndFlags
            }

            Self::ReadVersionAndFlags => {
                let version = reader.u32(At::Header, "version")?;
                let flags = reader.u32(At::Header, "flags")?;

                let file_version = (version & 0xFFFF) as u16;
                let licensee_version = (version >> 16) as u16;

                if !(global::MIN_VERSION..=global::CURRENT_VERSION)
                    .contains(&file_version)
                {
                    return Err(LinkError::VersionUnsupported(file_version));
                }

                Self::ReadTableCounts(Summary {
                    file_version,
                    licensee_version,
                    flags: ContainerFlags::from_bits_retain(flags),
                    ..Default::default()
                })
            }

            Self::ReadTableCounts(mut summary) => {
                summary.symbols =
                    read_table_info(reader, "symbol count", "symbol offset")?;
                summary.exports =
                    read_table_info(reader, "export count", "export offset")?;
                summary.imports =
                    read_table_info(reader, "import count", "import offset")?;

                Self::ReadGenerationInfoOrHeritage(summary)
            }

            Self::ReadGenerationInfoOrHeritage(mut summary) => {
                if summary.file_version >= global::GENERATIONS_VERSION {
                    read_generations(reader, &mut summary)?;
                } else {
                    read_heritage(reader, &mut summary)?;
                }

                Self::Ready(summary)
            }

            ready @ Self::Ready(_) => ready,
        };

        trace!("summary: {next}");
        Ok(next)
    }
}

/// Read a table count and offset,
///   ensuring that the offset lies within the container.
fn read_table_info(
    reader: &mut ContainerReader,
    count_field: &'static str,
    offset_field: &'static str,
) -> Result<TableInfo> {
    let count = reader.len_field(At::Header, count_field)?;

    let at = reader.position();
    let offset = reader.len_field(At::Header, offset_field)?;

    if u64::from(offset) > reader.len() {
        return Err(LinkError::CorruptHeader {
            field: offset_field,
            offset: at,
        });
    }

    Ok(TableInfo { count, offset })
}

fn read_guid(
    reader: &mut ContainerReader,
    field: &'static str,
) -> Result<Guid> {
    Ok(Guid::from_words([
        reader.u32(At::Header, field)?,
        reader.u32(At::Header, field)?,
        reader.u32(At::Header, field)?,
        reader.u32(At::Header, field)?,
    ]))
}

fn read_generations(
    reader: &mut ContainerReader,
    summary: &mut Summary,
) -> Result<()> {
    summary.guid = read_guid(reader, "guid")?;

    let at = reader.position();
    let count = reader.u32(At::Header, "generation count")?;

    let remaining = reader.len().saturating_sub(reader.position());
    if u64::from(count) * GENERATION_LEN > remaining {
        return Err(LinkError::CorruptHeader {
            field: "generation count",
            offset: at,
        });
    }

    summary.generations = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let export_count = reader.u32(At::Header, "generation exports")?;
        let name_count = reader.u32(At::Header, "generation names")?;

        summary.generations.push(Generation {
            export_count,
            name_count,
        });
    }

    Ok(())
}

/// Read the identity stamps of a container predating generation
///   records.
///
/// Only the last stamp is retained as the container's identity,
///   and a single generation is synthesized from the table counts that
///   have already been read.
fn read_heritage(
    reader: &mut ContainerReader,
    summary: &mut Summary,
) -> Result<()> {
    let count = reader.len_field(At::Header, "heritage count")?;

    let at = reader.position();
    let offset = reader.len_field(At::Header, "heritage offset")?;

    let end = u64::from(offset) + u64::from(count) * HERITAGE_GUID_LEN;
    if end > reader.len() {
        return Err(LinkError::CorruptHeader {
            field: "heritage offset",
            offset: at,
        });
    }

    let resume = reader.position();
    reader.seek(u64::from(offset));

    let mut guid = Guid::default();
    for _ in 0..count {
        guid = read_guid(reader, "heritage")?;
    }

    reader.seek(resume);

    summary.guid = guid;
    summary.generations = vec![Generation {
        export_count: summary.exports.count,
        name_count: summary.symbols.count,
    }];

    trace!(
        "summary: {count} heritage stamp(s) at offset {offset}, \
         using identity {guid}",
    );

    Ok(())
}

/// Summary write state.
///
/// These mirror [`ReadState`],
///   except that only the newest layout is ever written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteState {
    #[default]
    WriteTag,
    WriteVersionAndFlags,
    WriteTableCounts,
    WriteGenerationInfo,
    Done,
}

impl Display for WriteState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::WriteTag => write!(f, "writing container tag"),
            Self::WriteVersionAndFlags => {
                write!(f, "writing container version and flags")
            }
            Self::WriteTableCounts => write!(f, "writing table locations"),
            Self::WriteGenerationInfo => {
                write!(f, "writing generation history")
            }
            Self::Done => write!(f, "summary written"),
        }
    }
}

impl WriteState {
    /// Write the fields of this state and transition to the next.
    pub fn write_next<W: Write>(
        self,
        summary: &Summary,
        writer: &mut W,
    ) -> io::Result<Self> {
        let next = match self {
            Self::WriteTag => {
                writer.write_u32::<LittleEndian>(global::CONTAINER_TAG)?;
                Self::WriteVersionAndFlags
            }

            Self::WriteVersionAndFlags => {
                let version = (u32::from(summary.licensee_version) << 16)
                    | u32::from(global::CURRENT_VERSION);

                writer.write_u32::<LittleEndian>(version)?;
                writer.write_u32::<LittleEndian>(summary.flags.bits())?;
                Self::WriteTableCounts
            }

            Self::WriteTableCounts => {
                let Summary {
                    symbols, exports, imports, ..
                } = summary;

                for info in [symbols, exports, imports] {
                    writer.write_i32::<LittleEndian>(info.count as i32)?;
                    writer.write_i32::<LittleEndian>(info.offset as i32)?;
                }

                Self::WriteGenerationInfo
            }

            Self::WriteGenerationInfo => {
                for word in summary.guid.words() {
                    writer.write_u32::<LittleEndian>(word)?;
                }

                writer.write_u32::<LittleEndian>(
                    summary.generations.len() as u32,
                )?;

                for generation in &summary.generations {
                    let Generation {
                        export_count,
                        name_count,
                    } = *generation;

                    writer.write_u32::<LittleEndian>(export_count)?;
                    writer.write_u32::<LittleEndian>(name_count)?;
                }

                Self::Done
            }

            Self::Done => Self::Done,
        };

        trace!("summary: {next}");
        Ok(next)
    }
}
