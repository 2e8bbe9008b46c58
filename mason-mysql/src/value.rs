use crate::error::Error;
use crate::protocol::types::ColumnType;

/// A typed value decoded from (or destined for) a text-protocol row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Date(u16, u8, u8),
    Time(u8, u8, u8),
    DateTime(DateTimeValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeValue {
    pub date: (u16, u8, u8),
    pub time: (u8, u8, u8),
}

/// Converts a raw text-protocol column value into a typed `Value`, per the
/// column's wire type tag. The LCB NULL sentinel is handled by the row
/// decoder before this function ever runs; a non-`None` byte string always
/// reaches here.
pub(crate) fn decode_text_value(bytes: &[u8], ty: ColumnType) -> Result<Value, Error> {
    use ColumnType::*;

    // Only the branches that parse the bytes as text need them to *be*
    // text; blobs and opaque `VAR_STRING`/`STRING` columns fall through to
    // `Value::Bytes` untouched, since §4.4 specifies "raw bytes" for them
    // with no utf-8 requirement.
    Ok(match ty {
        Tiny | Short | Long | LongLong | Int24 | Year => {
            let s = as_utf8(bytes)?;
            let n: i64 = s
                .parse()
                .map_err(|_| crate::error::protocol_err!("expected integer, got `{}`", s))?;
            Value::Int(n)
        }

        Decimal | NewDecimal | Float | Double => {
            let s = as_utf8(bytes)?;
            match s.parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => {
                    let n: i64 = s
                        .parse()
                        .map_err(|_| crate::error::protocol_err!("expected numeric, got `{}`", s))?;
                    Value::Int(n)
                }
            }
        }

        Timestamp | DateTime => parse_datetime(as_utf8(bytes)?)?,

        Date => parse_date(as_utf8(bytes)?)?,

        Time => parse_time(as_utf8(bytes)?)?,

        _ => Value::Bytes(bytes.to_vec()),
    })
}

fn as_utf8(bytes: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(bytes).map_err(|_| crate::error::protocol_err!("column value is not valid utf-8"))
}

fn parse_date(s: &str) -> Result<Value, Error> {
    let (y, m, d) = split_date(s)?;
    Ok(Value::Date(y, m, d))
}

fn parse_time(s: &str) -> Result<Value, Error> {
    let (h, mi, se) = split_time(s)?;
    Ok(Value::Time(h, mi, se))
}

fn parse_datetime(s: &str) -> Result<Value, Error> {
    let mut parts = s.splitn(2, ' ');
    let date_part = parts
        .next()
        .ok_or_else(|| crate::error::protocol_err!("malformed datetime `{}`", s))?;
    let time_part = parts
        .next()
        .ok_or_else(|| crate::error::protocol_err!("malformed datetime `{}`", s))?;

    Ok(Value::DateTime(DateTimeValue {
        date: split_date(date_part)?,
        time: split_time(time_part)?,
    }))
}

fn split_date(s: &str) -> Result<(u16, u8, u8), Error> {
    let mut it = s.splitn(3, '-');
    let err = || crate::error::protocol_err!("malformed date `{}`", s);
    let y = it.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    let m = it.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    let d = it.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    Ok((y, m, d))
}

fn split_time(s: &str) -> Result<(u8, u8, u8), Error> {
    let mut it = s.splitn(3, ':');
    let err = || crate::error::protocol_err!("malformed time `{}`", s);
    let h = it.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    let m = it.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    let s_: u8 = it.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    Ok((h, m, s_))
}

/// Serializes a `Value` into a SQL literal fragment suitable for `SET @N = <literal>`.
pub fn encode_literal(value: &Value) -> Result<String, Error> {
    Ok(match value {
        Value::Null => "null".to_owned(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Bytes(bytes) => encode_quoted(bytes),
        Value::Date(y, m, d) => format!("'{:04}-{:02}-{:02}'", y, m, d),
        Value::Time(h, m, s) => format!("'{:02}:{:02}:{:02}'", h, m, s),
        Value::DateTime(dt) => format!(
            "'{:04}-{:02}-{:02} {:02}:{:02}:{:02}'",
            dt.date.0, dt.date.1, dt.date.2, dt.time.0, dt.time.1, dt.time.2
        ),
    })
}

fn format_float(f: f64) -> String {
    // shortest round-trip representation; Rust's `{}` formatter already
    // produces this for f64 since 1.0 switched to the Grisu/Ryu algorithm.
    let mut s = format!("{}", f);
    if !s.contains('.') && !s.contains('e') && !s.contains("inf") && !s.contains("NaN") {
        s.push_str(".0");
    }
    s
}

fn encode_quoted(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('\'');
    for &b in bytes {
        match b {
            0x00 => out.push_str("\\0"),
            0x0A => out.push_str("\\n"),
            0x0D => out.push_str("\\r"),
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'"' => out.push_str("\\\""),
            0x1A => out.push_str("\\Z"),
            other => out.push(other as char),
        }
    }
    out.push('\'');
    out
}
