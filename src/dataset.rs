use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{SecondsFormat, Utc};
use parquet::basic::Compression;
use parquet::data_type::{BoolType, ByteArray, ByteArrayType, DataType, DoubleType, Int32Type, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::{SerializedColumnWriter, SerializedFileWriter};
use parquet::record::Field;
use parquet::schema::parser::parse_message_type;
use parquet::schema::types::Type;
use serde::{Deserialize, Serialize};

use crate::event_table::{EventRecord, EventType};

const EVENT_TABLE_SCHEMA: &str = "
message event_table {
    REQUIRED INT64 match_id;
    REQUIRED BYTE_ARRAY home_team (UTF8);
    REQUIRED BYTE_ARRAY away_team (UTF8);
    OPTIONAL BYTE_ARRAY team (UTF8);
    OPTIONAL BYTE_ARRAY player (UTF8);
    REQUIRED INT32 period;
    REQUIRED INT32 minute;
    REQUIRED INT32 second;
    OPTIONAL BYTE_ARRAY type (UTF8);
    OPTIONAL INT64 possession;
    OPTIONAL BYTE_ARRAY play_pattern (UTF8);
    OPTIONAL DOUBLE loc_x;
    OPTIONAL DOUBLE loc_y;
    OPTIONAL DOUBLE pass_end_x;
    OPTIONAL DOUBLE pass_end_y;
    REQUIRED BOOLEAN under_pressure;
    OPTIONAL DOUBLE shot_xg;
}
";

/// Column order of the persisted table; must mirror `EVENT_TABLE_SCHEMA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventColumn {
    MatchId,
    HomeTeam,
    AwayTeam,
    Team,
    Player,
    Period,
    Minute,
    Second,
    Type,
    Possession,
    PlayPattern,
    LocX,
    LocY,
    PassEndX,
    PassEndY,
    UnderPressure,
    ShotXg,
}

const COLUMNS: [EventColumn; 17] = [
    EventColumn::MatchId,
    EventColumn::HomeTeam,
    EventColumn::AwayTeam,
    EventColumn::Team,
    EventColumn::Player,
    EventColumn::Period,
    EventColumn::Minute,
    EventColumn::Second,
    EventColumn::Type,
    EventColumn::Possession,
    EventColumn::PlayPattern,
    EventColumn::LocX,
    EventColumn::LocY,
    EventColumn::PassEndX,
    EventColumn::PassEndY,
    EventColumn::UnderPressure,
    EventColumn::ShotXg,
];

impl EventColumn {
    fn name(self) -> &'static str {
        match self {
            Self::MatchId => "match_id",
            Self::HomeTeam => "home_team",
            Self::AwayTeam => "away_team",
            Self::Team => "team",
            Self::Player => "player",
            Self::Period => "period",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Type => "type",
            Self::Possession => "possession",
            Self::PlayPattern => "play_pattern",
            Self::LocX => "loc_x",
            Self::LocY => "loc_y",
            Self::PassEndX => "pass_end_x",
            Self::PassEndY => "pass_end_y",
            Self::UnderPressure => "under_pressure",
            Self::ShotXg => "shot_xg",
        }
    }
}

/// Informational sidecar written next to the parquet file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub competition_id: u32,
    pub season_id: u32,
    pub matches: usize,
    pub rows: usize,
    pub built_at: String,
}

impl DatasetManifest {
    pub fn new(competition_id: u32, season_id: u32, matches: usize, rows: usize) -> Self {
        Self {
            competition_id,
            season_id,
            matches,
            rows,
            built_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

pub fn manifest_path(events_path: &Path) -> PathBuf {
    let mut name = events_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".manifest.json");
    events_path.with_file_name(name)
}

pub fn write_manifest(events_path: &Path, manifest: &DatasetManifest) -> Result<()> {
    let path = manifest_path(events_path);
    let json = serde_json::to_string_pretty(manifest).context("serialize dataset manifest")?;
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn read_manifest(events_path: &Path) -> Result<Option<DatasetManifest>> {
    let path = manifest_path(events_path);
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let manifest = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(manifest))
}

/// Writes the event table as a single-row-group parquet file, swapping it in atomically.
pub fn write_events_table(path: &Path, events: &[EventRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
    }

    let schema = Arc::new(parse_message_type(EVENT_TABLE_SCHEMA).context("parse event schema")?);
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build(),
    );

    let tmp = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    if let Err(err) = write_row_group(file, schema, props, events) {
        let _ = fs::remove_file(&tmp);
        return Err(err.context(format!("write {}", tmp.display())));
    }
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    log::info!("wrote {} event rows to {}", events.len(), path.display());
    Ok(())
}

fn write_row_group(
    file: fs::File,
    schema: Arc<Type>,
    props: Arc<WriterProperties>,
    events: &[EventRecord],
) -> Result<()> {
    let mut writer =
        SerializedFileWriter::new(file, schema, props).context("open parquet writer")?;
    let mut row_group = writer.next_row_group().context("start row group")?;

    for column in COLUMNS {
        let Some(mut col) = row_group.next_column().context("next parquet column")? else {
            bail!("parquet schema ended before column {}", column.name());
        };
        write_column(&mut col, column, events)
            .with_context(|| format!("write column {}", column.name()))?;
        col.close()
            .with_context(|| format!("close column {}", column.name()))?;
    }

    row_group.close().context("close row group")?;
    writer.close().context("close parquet writer")?;
    Ok(())
}

fn write_column(
    col: &mut SerializedColumnWriter<'_>,
    column: EventColumn,
    events: &[EventRecord],
) -> Result<()> {
    match column {
        EventColumn::MatchId => {
            let values = events
                .iter()
                .map(|e| i64::try_from(e.match_id).context("match_id exceeds i64"))
                .collect::<Result<Vec<_>>>()?;
            write_required::<Int64Type>(col, &values)
        }
        EventColumn::HomeTeam => write_required::<ByteArrayType>(
            col,
            &events
                .iter()
                .map(|e| ByteArray::from(e.home_team.as_str()))
                .collect::<Vec<_>>(),
        ),
        EventColumn::AwayTeam => write_required::<ByteArrayType>(
            col,
            &events
                .iter()
                .map(|e| ByteArray::from(e.away_team.as_str()))
                .collect::<Vec<_>>(),
        ),
        EventColumn::Team => write_optional_str(col, events.iter().map(|e| e.team.as_deref())),
        EventColumn::Player => write_optional_str(col, events.iter().map(|e| e.player.as_deref())),
        EventColumn::Period => write_u32(col, events.iter().map(|e| e.period)),
        EventColumn::Minute => write_u32(col, events.iter().map(|e| e.minute)),
        EventColumn::Second => write_u32(col, events.iter().map(|e| e.second)),
        EventColumn::Type => write_optional_str(col, events.iter().map(|e| e.type_name())),
        EventColumn::Possession => {
            write_optional::<Int64Type>(col, events.iter().map(|e| e.possession))
        }
        EventColumn::PlayPattern => {
            write_optional_str(col, events.iter().map(|e| e.play_pattern.as_deref()))
        }
        EventColumn::LocX => write_optional::<DoubleType>(col, events.iter().map(|e| e.loc_x)),
        EventColumn::LocY => write_optional::<DoubleType>(col, events.iter().map(|e| e.loc_y)),
        EventColumn::PassEndX => {
            write_optional::<DoubleType>(col, events.iter().map(|e| e.pass_end_x))
        }
        EventColumn::PassEndY => {
            write_optional::<DoubleType>(col, events.iter().map(|e| e.pass_end_y))
        }
        EventColumn::UnderPressure => write_required::<BoolType>(
            col,
            &events.iter().map(|e| e.under_pressure).collect::<Vec<_>>(),
        ),
        EventColumn::ShotXg => write_optional::<DoubleType>(col, events.iter().map(|e| e.shot_xg)),
    }
}

fn write_required<T: DataType>(col: &mut SerializedColumnWriter<'_>, values: &[T::T]) -> Result<()> {
    col.typed::<T>().write_batch(values, None, None)?;
    Ok(())
}

fn write_optional<T: DataType>(
    col: &mut SerializedColumnWriter<'_>,
    values: impl Iterator<Item = Option<T::T>>,
) -> Result<()> {
    let mut def_levels = Vec::new();
    let mut present = Vec::new();
    for value in values {
        def_levels.push(i16::from(value.is_some()));
        present.extend(value);
    }
    col.typed::<T>()
        .write_batch(&present, Some(&def_levels), None)?;
    Ok(())
}

fn write_optional_str<'a>(
    col: &mut SerializedColumnWriter<'_>,
    values: impl Iterator<Item = Option<&'a str>>,
) -> Result<()> {
    write_optional::<ByteArrayType>(col, values.map(|v| v.map(ByteArray::from)))
}

fn write_u32(col: &mut SerializedColumnWriter<'_>, values: impl Iterator<Item = u32>) -> Result<()> {
    let values = values
        .map(|v| i32::try_from(v).context("value exceeds i32"))
        .collect::<Result<Vec<_>>>()?;
    write_required::<Int32Type>(col, &values)
}

/// Reads an event table written by [`write_events_table`]. Any layout or decode problem is fatal.
pub fn read_events_table(path: &Path) -> Result<Vec<EventRecord>> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("open parquet reader {}", path.display()))?;

    let names = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect::<Vec<_>>();
    let expected = COLUMNS.iter().map(|c| c.name()).collect::<Vec<_>>();
    if names != expected {
        bail!(
            "{} is not an event table (columns: {})",
            path.display(),
            names.join(", ")
        );
    }

    let iter = reader.get_row_iter(None).context("iterate event rows")?;
    let mut out = Vec::new();
    for (idx, row) in iter.enumerate() {
        let row = row.with_context(|| format!("decode event row {idx}"))?;
        let fields = row.get_column_iter().map(|(_, f)| f).collect::<Vec<_>>();
        let event = decode_row(&fields).with_context(|| format!("event row {idx}"))?;
        out.push(event);
    }
    log::info!("loaded {} event rows from {}", out.len(), path.display());
    Ok(out)
}

fn decode_row(fields: &[&Field]) -> Result<EventRecord> {
    if fields.len() != COLUMNS.len() {
        bail!("expected {} fields, got {}", COLUMNS.len(), fields.len());
    }
    // COLUMNS order is the schema order, checked when the file was opened.
    let field = |column: EventColumn| fields[column as usize];

    let match_id = match field(EventColumn::MatchId) {
        Field::Long(v) => u64::try_from(*v).context("negative match_id")?,
        other => return Err(type_error(EventColumn::MatchId, other)),
    };

    Ok(EventRecord {
        match_id,
        home_team: required_str(field(EventColumn::HomeTeam), EventColumn::HomeTeam)?,
        away_team: required_str(field(EventColumn::AwayTeam), EventColumn::AwayTeam)?,
        team: optional_str(field(EventColumn::Team), EventColumn::Team)?,
        player: optional_str(field(EventColumn::Player), EventColumn::Player)?,
        period: required_u32(field(EventColumn::Period), EventColumn::Period)?,
        minute: required_u32(field(EventColumn::Minute), EventColumn::Minute)?,
        second: required_u32(field(EventColumn::Second), EventColumn::Second)?,
        event_type: optional_str(field(EventColumn::Type), EventColumn::Type)?
            .map(|name| EventType::from_name(&name)),
        possession: match field(EventColumn::Possession) {
            Field::Null => None,
            Field::Long(v) => Some(*v),
            other => return Err(type_error(EventColumn::Possession, other)),
        },
        play_pattern: optional_str(field(EventColumn::PlayPattern), EventColumn::PlayPattern)?,
        loc_x: optional_f64(field(EventColumn::LocX), EventColumn::LocX)?,
        loc_y: optional_f64(field(EventColumn::LocY), EventColumn::LocY)?,
        pass_end_x: optional_f64(field(EventColumn::PassEndX), EventColumn::PassEndX)?,
        pass_end_y: optional_f64(field(EventColumn::PassEndY), EventColumn::PassEndY)?,
        under_pressure: match field(EventColumn::UnderPressure) {
            Field::Bool(v) => *v,
            other => return Err(type_error(EventColumn::UnderPressure, other)),
        },
        shot_xg: optional_f64(field(EventColumn::ShotXg), EventColumn::ShotXg)?,
    })
}

fn required_str(field: &Field, column: EventColumn) -> Result<String> {
    optional_str(field, column)?.ok_or_else(|| anyhow!("column {} is null", column.name()))
}

fn optional_str(field: &Field, column: EventColumn) -> Result<Option<String>> {
    match field {
        Field::Null => Ok(None),
        Field::Str(s) => Ok(Some(s.clone())),
        other => Err(type_error(column, other)),
    }
}

fn optional_f64(field: &Field, column: EventColumn) -> Result<Option<f64>> {
    match field {
        Field::Null => Ok(None),
        Field::Double(v) => Ok(Some(*v)),
        other => Err(type_error(column, other)),
    }
}

fn required_u32(field: &Field, column: EventColumn) -> Result<u32> {
    match field {
        Field::Int(v) => u32::try_from(*v).with_context(|| format!("negative {}", column.name())),
        other => Err(type_error(column, other)),
    }
}

fn type_error(column: EventColumn, found: &Field) -> anyhow::Error {
    anyhow!("unexpected value {found} in column {}", column.name())
}
