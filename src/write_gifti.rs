use crate::array::codec;
use crate::array::{DataArray, Encoding};
use crate::data::{Gifti, MetaData};
use crate::label::LabelTable;
use crate::transform::CoordTransform;
use crate::utils;
use crate::Error;

use std::io::Write;
use std::path::Path;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

const DOCTYPE: &str = r#"GIFTI SYSTEM "http://www.nitrc.org/frs/download.php/115/gifti.dtd""#;

/// Write a given GIFTI container to a `Writer`
pub fn write_gifti<W: Write>(writer: W, data: &Gifti) -> Result<(), Error> {
    data.check()?;

    let mut writer = Writer::new_with_indent(writer, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::DocType(BytesText::from_escaped(DOCTYPE)))?;

    let num_arrays = data.arrays.len().to_string();
    let mut root = BytesStart::new("GIFTI");
    root.push_attribute(("Version", data.version.as_str()));
    root.push_attribute(("NumberOfDataArrays", num_arrays.as_str()));
    writer.write_event(Event::Start(root))?;

    write_metadata(&mut writer, &data.meta)?;
    write_label_table(&mut writer, &data.labels)?;

    for array in &data.arrays {
        write_data_array(&mut writer, array)?;
    }

    writer.write_event(Event::End(BytesEnd::new("GIFTI")))?;

    // trailing newline
    writer.inner().write_all(b"\n")?;

    Ok(())
}

/// Write a container to a file at `path`, replacing any existing file
pub fn write_gifti_file(path: &Path, data: &Gifti) -> Result<(), Error> {
    let file = std::fs::File::create(path)?;
    let mut buf_writer = std::io::BufWriter::new(file);
    write_gifti(&mut buf_writer, data)?;
    buf_writer.flush()?;
    Ok(())
}

/// Render a container to an in-memory xml document
pub fn to_string(data: &Gifti) -> Result<String, Error> {
    let mut bytes = Vec::new();
    write_gifti(&mut bytes, data)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// CDATA cannot hold its own terminator, fall back to escaped text
fn write_character_data<W: Write>(writer: &mut Writer<W>, text: &str) -> Result<(), Error> {
    if text.contains("]]>") {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    } else {
        writer.write_event(Event::CData(BytesCData::new(text)))?;
    }
    Ok(())
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    write_character_data(writer, text)?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_metadata<W: Write>(writer: &mut Writer<W>, meta: &MetaData) -> Result<(), Error> {
    if meta.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new("MetaData")))?;
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("MetaData")))?;

    for (name, value) in meta.iter() {
        writer.write_event(Event::Start(BytesStart::new("MD")))?;
        write_text_element(writer, "Name", name)?;
        write_text_element(writer, "Value", value)?;
        writer.write_event(Event::End(BytesEnd::new("MD")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("MetaData")))?;
    Ok(())
}

fn write_label_table<W: Write>(writer: &mut Writer<W>, labels: &LabelTable) -> Result<(), Error> {
    if labels.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new("LabelTable")))?;
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("LabelTable")))?;

    for label in labels.iter() {
        let key = label.key.to_string();
        let channels = label
            .color
            .map(|color| color.map(|channel| utils::format_float(f64::from(channel))));

        let mut start = BytesStart::new("Label");
        start.push_attribute(("Key", key.as_str()));
        if let Some([red, green, blue, alpha]) = &channels {
            start.push_attribute(("Red", red.as_str()));
            start.push_attribute(("Green", green.as_str()));
            start.push_attribute(("Blue", blue.as_str()));
            start.push_attribute(("Alpha", alpha.as_str()));
        }

        writer.write_event(Event::Start(start))?;
        write_character_data(writer, &label.name)?;
        writer.write_event(Event::End(BytesEnd::new("Label")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("LabelTable")))?;
    Ok(())
}

fn write_data_array<W: Write>(writer: &mut Writer<W>, array: &DataArray) -> Result<(), Error> {
    let text = encode_data(array)?;

    let dims: Vec<(String, String)> = array
        .dims
        .iter()
        .enumerate()
        .map(|(axis, dim)| (format!("Dim{axis}"), dim.to_string()))
        .collect();
    let dimensionality = array.num_dims().to_string();

    let mut start = BytesStart::new("DataArray");
    start.push_attribute(("Intent", array.intent.name()));
    start.push_attribute(("DataType", array.kind.name()));
    start.push_attribute(("ArrayIndexingOrder", array.order.name()));
    start.push_attribute(("Dimensionality", dimensionality.as_str()));
    for (key, value) in &dims {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    start.push_attribute(("Encoding", array.encoding.name()));
    start.push_attribute(("Endian", array.endian.name()));
    start.push_attribute(("ExternalFileName", ""));
    start.push_attribute(("ExternalFileOffset", ""));
    writer.write_event(Event::Start(start))?;

    write_metadata(writer, &array.meta)?;

    for transform in &array.transforms {
        write_transform(writer, transform)?;
    }

    writer.write_event(Event::Start(BytesStart::new("Data")))?;
    writer.write_event(Event::Text(BytesText::new(&text)))?;
    writer.write_event(Event::End(BytesEnd::new("Data")))?;

    writer.write_event(Event::End(BytesEnd::new("DataArray")))?;
    Ok(())
}

fn encode_data(array: &DataArray) -> Result<String, Error> {
    match array.encoding {
        Encoding::Ascii => {
            let per_line = array.columns() * array.kind.lanes();
            codec::encode_ascii(array.bytes(), array.kind, array.endian, per_line).ok_or_else(
                || {
                    Error::InvalidContainer(format!(
                        "{} array buffer is not a whole number of elements",
                        array.kind.name()
                    ))
                },
            )
        }
        Encoding::Base64Binary => Ok(codec::encode_base64(array.bytes())),
        other => Err(Error::InvalidContainer(format!(
            "writing {} encoded arrays is not supported",
            other.name()
        ))),
    }
}

fn write_transform<W: Write>(
    writer: &mut Writer<W>,
    transform: &CoordTransform,
) -> Result<(), Error> {
    writer.write_event(Event::Start(BytesStart::new("CoordinateSystemTransformMatrix")))?;

    write_text_element(writer, "DataSpace", transform.data_space.name())?;
    write_text_element(writer, "TransformedSpace", transform.transformed_space.name())?;

    let rows: Vec<String> = transform
        .matrix
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|value| utils::format_float(*value))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    let matrix = rows.join("\n");

    writer.write_event(Event::Start(BytesStart::new("MatrixData")))?;
    writer.write_event(Event::Text(BytesText::new(&matrix)))?;
    writer.write_event(Event::End(BytesEnd::new("MatrixData")))?;

    writer.write_event(Event::End(BytesEnd::new("CoordinateSystemTransformMatrix")))?;
    Ok(())
}
