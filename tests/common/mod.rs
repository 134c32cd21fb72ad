#![allow(dead_code)]

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;

/// One OD row as written to a Parquet test file. `date` is days since the Unix epoch.
pub struct OdRow<'a> {
    pub date: i32,
    pub hour: Option<i32>,
    pub entry: &'a str,
    pub exit: &'a str,
    pub count: i64,
}

pub fn od_row<'a>(date: i32, hour: Option<i32>, entry: &'a str, exit: &'a str, count: i64) -> OdRow<'a> {
    OdRow {
        date,
        hour,
        entry,
        exit,
        count,
    }
}

/// 2024-01-01 in days since the Unix epoch.
pub const JAN_1_2024: i32 = 19_723;

/// Write `rows` with a `DATE` date column, an optional `INT32` hour column, two UTF-8 station
/// columns and an `INT64` count column.
pub fn write_od_parquet(path: &Path, rows: &[OdRow<'_>]) {
    let schema_str = r#"
    message schema {
      REQUIRED INT32 date (DATE);
      OPTIONAL INT32 hour;
      REQUIRED BINARY entry_station (UTF8);
      REQUIRED BINARY exit_station (UTF8);
      REQUIRED INT64 passenger_count;
    }
    "#;

    let schema = Arc::new(parse_message_type(schema_str).unwrap());
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();

    let dates: Vec<i32> = rows.iter().map(|r| r.date).collect();
    let hours: Vec<i32> = rows.iter().filter_map(|r| r.hour).collect();
    let hour_levels: Vec<i16> = rows.iter().map(|r| i16::from(r.hour.is_some())).collect();
    let entries: Vec<ByteArray> = rows.iter().map(|r| ByteArray::from(r.entry)).collect();
    let exits: Vec<ByteArray> = rows.iter().map(|r| ByteArray::from(r.exit)).collect();
    let counts: Vec<i64> = rows.iter().map(|r| r.count).collect();

    let mut rg = writer.next_row_group().unwrap();
    let mut col_idx: usize = 0;
    while let Some(mut col) = rg.next_column().unwrap() {
        match (col_idx, col.untyped()) {
            (0, ColumnWriter::Int32ColumnWriter(w)) => {
                w.write_batch(&dates, None, None).unwrap();
            }
            (1, ColumnWriter::Int32ColumnWriter(w)) => {
                w.write_batch(&hours, Some(&hour_levels), None).unwrap();
            }
            (2, ColumnWriter::ByteArrayColumnWriter(w)) => {
                w.write_batch(&entries, None, None).unwrap();
            }
            (3, ColumnWriter::ByteArrayColumnWriter(w)) => {
                w.write_batch(&exits, None, None).unwrap();
            }
            (4, ColumnWriter::Int64ColumnWriter(w)) => {
                w.write_batch(&counts, None, None).unwrap();
            }
            _ => panic!("unexpected column writer in test"),
        }
        col.close().unwrap();
        col_idx += 1;
    }
    rg.close().unwrap();
    writer.close().unwrap();
}

/// Write a Parquet file that lacks the `exit_station` column.
pub fn write_parquet_without_exit(path: &Path) {
    let schema_str = r#"
    message schema {
      REQUIRED BINARY date (UTF8);
      REQUIRED INT32 hour;
      REQUIRED BINARY entry_station (UTF8);
      REQUIRED INT64 passenger_count;
    }
    "#;

    let schema = Arc::new(parse_message_type(schema_str).unwrap());
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();

    let mut rg = writer.next_row_group().unwrap();
    let mut col_idx: usize = 0;
    while let Some(mut col) = rg.next_column().unwrap() {
        match (col_idx, col.untyped()) {
            (0, ColumnWriter::ByteArrayColumnWriter(w)) => {
                w.write_batch(&[ByteArray::from("2024-01-01")], None, None).unwrap();
            }
            (1, ColumnWriter::Int32ColumnWriter(w)) => {
                w.write_batch(&[8], None, None).unwrap();
            }
            (2, ColumnWriter::ByteArrayColumnWriter(w)) => {
                w.write_batch(&[ByteArray::from("A")], None, None).unwrap();
            }
            (3, ColumnWriter::Int64ColumnWriter(w)) => {
                w.write_batch(&[1_i64], None, None).unwrap();
            }
            _ => panic!("unexpected column writer in test"),
        }
        col.close().unwrap();
        col_idx += 1;
    }
    rg.close().unwrap();
    writer.close().unwrap();
}

/// Write a CSV file with the default OD headers.
pub fn write_od_csv(path: &Path, rows: &[(&str, &str, &str, &str, i64)]) {
    let mut out = String::from("date,hour,entry_station,exit_station,passenger_count\n");
    for (date, hour, entry, exit, count) in rows {
        out.push_str(&format!("{date},{hour},{entry},{exit},{count}\n"));
    }
    std::fs::write(path, out).unwrap();
}
