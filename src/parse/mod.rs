//! reading and parsing GIFTI xml files
//!
//! most of the time you will not need to interact with this module directly,
//! [`read_surface`](`crate::read_surface`) reads a file straight into a
//! [`Surface`](`crate::Surface`)

mod error;
mod event_summary;

pub use error::ParseError;
use event_summary::EventSummary;

use crate::array::codec;
use crate::array::{DataArray, ElementKind, Encoding, Endian, IndexOrder, Intent};
use crate::data::{Gifti, MetaData, GIFTI_VERSION};
use crate::label::{Label, LabelTable};
use crate::transform::{Affine, CoordTransform, XformSpace};
use crate::Error;

use std::io::BufRead;
use std::path::Path;

use ndarray::Array2;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// read in and parse an entire GIFTI file for a given path
pub fn read_gifti(path: &Path) -> Result<Gifti, Error> {
    let file = std::fs::File::open(path)?;
    let buf_reader = std::io::BufReader::new(file);
    let reader = Reader::from_reader(buf_reader);

    parse_xml_document(reader)
}

/// parse a GIFTI document from any buffered source
pub fn parse_gifti<R: BufRead>(source: R) -> Result<Gifti, Error> {
    parse_xml_document(Reader::from_reader(source))
}

/// parse a GIFTI document from an already constructed reader
pub fn parse_xml_document<R: BufRead>(mut reader: Reader<R>) -> Result<Gifti, Error> {
    reader.trim_text(true);
    let mut buffer = Vec::new();

    let gifti = read_document(&mut reader, &mut buffer)?;
    Ok(gifti)
}

fn read_document<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<Gifti, ParseError> {
    let header = read_header(reader, buffer)?;

    let mut gifti = Gifti::new();
    gifti.version = header.version;

    if !header.empty {
        loop {
            match next_element::<error::Header, _>(reader, buffer)? {
                Element::Start { name, .. } if name == "MetaData" => {
                    gifti.meta = read_metadata_body(reader, buffer)?;
                }
                Element::Start { name, .. } if name == "LabelTable" => {
                    gifti.labels = read_label_table(reader, buffer)?;
                }
                Element::Start { name, attributes } if name == "DataArray" => {
                    let array = read_data_array(reader, buffer, &attributes, false)?;
                    gifti.arrays.push(array);
                }
                Element::Empty { name, attributes } if name == "DataArray" => {
                    let array = read_data_array(reader, buffer, &attributes, true)?;
                    gifti.arrays.push(array);
                }
                Element::Empty { name, .. } if name == "MetaData" || name == "LabelTable" => {}
                Element::End { name } if name == "GIFTI" => break,
                other => {
                    let unexpected = error::UnexpectedElement::new(
                        "MetaData, LabelTable, DataArray or /GIFTI",
                        other.summary(),
                    );
                    return Err(error::Header::from(unexpected).into());
                }
            }
        }
    }

    if let Some(declared) = header.declared_arrays {
        if declared != gifti.arrays.len() {
            log::warn!(
                "GIFTI header declares {declared} data arrays but {} were read",
                gifti.arrays.len()
            );
        }
    }

    Ok(gifti)
}

/// An owned xml event. Converting immediately lets the read buffer be reused
/// for the next event while the element is still being inspected.
#[derive(Debug, Clone, PartialEq)]
enum Element {
    Start {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Empty {
        name: String,
        attributes: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Text(String),
    Eof,
}

impl Element {
    fn summary(&self) -> EventSummary {
        match self {
            Element::Start { name, .. } => EventSummary::new(Some(name.as_str()), "start"),
            Element::Empty { name, .. } => EventSummary::new(Some(name.as_str()), "empty"),
            Element::End { name } => EventSummary::new(Some(name.as_str()), "end"),
            Element::Text(_) => EventSummary::new(None, "text"),
            Element::Eof => EventSummary::eof(),
        }
    }
}

fn next_element<E, R: BufRead>(reader: &mut Reader<R>, buffer: &mut Vec<u8>) -> Result<Element, E>
where
    E: From<error::MalformedXml> + From<error::MalformedAttribute>,
{
    loop {
        buffer.clear();
        let event = reader
            .read_event_into(buffer)
            .map_err(error::MalformedXml::from)?;

        let element = match event {
            Event::Start(start) => Element::Start {
                name: element_name(&start),
                attributes: read_attributes::<E>(&start)?,
            },
            Event::Empty(empty) => Element::Empty {
                name: element_name(&empty),
                attributes: read_attributes::<E>(&empty)?,
            },
            Event::End(end) => Element::End {
                name: String::from_utf8_lossy(end.name().as_ref()).into_owned(),
            },
            Event::Text(text) => {
                let text = text.unescape().map_err(error::MalformedXml::from)?;
                if text.trim().is_empty() {
                    continue;
                }
                Element::Text(text.into_owned())
            }
            Event::CData(cdata) => {
                Element::Text(String::from_utf8_lossy(&cdata.into_inner()).into_owned())
            }
            Event::Eof => Element::Eof,
            other => {
                // declarations, doctypes, comments and processing instructions
                log::trace!("skipping xml {} event", event_summary::event_type(&other));
                continue;
            }
        };

        return Ok(element);
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn read_attributes<E>(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, E>
where
    E: From<error::MalformedXml> + From<error::MalformedAttribute>,
{
    let mut attributes = Vec::new();

    for attribute in start.attributes() {
        let attribute = attribute.map_err(error::MalformedAttribute::from)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(error::MalformedXml::from)?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(attributes)
}

fn optional_attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn get_attribute_value<'a, E>(
    attributes: &'a [(String, String)],
    attribute_key: &str,
    element_name: &str,
) -> Result<&'a str, E>
where
    E: From<error::MissingAttribute>,
{
    optional_attribute(attributes, attribute_key).ok_or_else(|| {
        E::from(error::MissingAttribute::new(
            element_name.into(),
            attribute_key.into(),
        ))
    })
}

fn parse_attribute<T, E>(value: &str, attribute_key: &str, element_name: &str) -> Result<T, E>
where
    T: std::str::FromStr,
    E: From<error::InvalidValue>,
{
    value.trim().parse().map_err(|_| {
        E::from(error::InvalidValue::new(
            element_name.into(),
            attribute_key.into(),
            value.into(),
        ))
    })
}

/// collect the text (and CDATA) content of an element up to its closing tag
fn read_text_until_end<E, R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    element_name: &str,
) -> Result<String, E>
where
    E: From<error::MalformedXml> + From<error::MalformedAttribute> + From<error::UnexpectedElement>,
{
    let mut contents = String::new();

    loop {
        match next_element::<E, _>(reader, buffer)? {
            Element::Text(text) => contents.push_str(&text),
            Element::End { name } if name == element_name => return Ok(contents),
            other => {
                let unexpected =
                    error::UnexpectedElement::new(format!("/{element_name}"), other.summary());
                return Err(E::from(unexpected));
            }
        }
    }
}

/// the text content of a child element that is either `<X>..</X>` or `<X/>`
fn read_text_element<E, R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    element: &Element,
) -> Result<Option<String>, E>
where
    E: From<error::MalformedXml> + From<error::MalformedAttribute> + From<error::UnexpectedElement>,
{
    match element {
        Element::Start { name, .. } => read_text_until_end::<E, _>(reader, buffer, name).map(Some),
        Element::Empty { .. } => Ok(Some(String::new())),
        _ => Ok(None),
    }
}

struct Header {
    version: String,
    declared_arrays: Option<usize>,
    empty: bool,
}

/// find the leading `<GIFTI>` element
fn read_header<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<Header, error::Header> {
    let (attributes, empty) = match next_element::<error::Header, _>(reader, buffer)? {
        Element::Start { name, attributes } if name == "GIFTI" => (attributes, false),
        Element::Empty { name, attributes } if name == "GIFTI" => (attributes, true),
        other => {
            let unexpected = error::UnexpectedElement::new("GIFTI", other.summary());
            return Err(error::Header::from(unexpected));
        }
    };

    let version = match optional_attribute(&attributes, "Version") {
        Some(version) => version.trim().to_string(),
        None => {
            log::warn!("GIFTI element has no Version attribute, assuming {GIFTI_VERSION}");
            GIFTI_VERSION.to_string()
        }
    };

    let declared_arrays = optional_attribute(&attributes, "NumberOfDataArrays").and_then(|value| {
        let parsed = value.trim().parse().ok();
        if parsed.is_none() {
            log::warn!("ignoring malformed NumberOfDataArrays `{value}`");
        }
        parsed
    });

    Ok(Header {
        version,
        declared_arrays,
        empty,
    })
}

/// read the `<MD>` entries of a `<MetaData>` element whose start tag was just consumed
fn read_metadata_body<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<MetaData, error::MetaDataElement> {
    let mut meta = MetaData::new();

    loop {
        match next_element::<error::MetaDataElement, _>(reader, buffer)? {
            Element::Start { name, .. } if name == "MD" => {
                let (key, value) = read_metadata_entry(reader, buffer)?;
                match key {
                    Some(key) => {
                        meta.insert(key, value.unwrap_or_default());
                    }
                    None => log::warn!("skipping a metadata entry without a <Name>"),
                }
            }
            Element::Empty { name, .. } if name == "MD" => {
                log::warn!("skipping an empty metadata entry");
            }
            Element::End { name } if name == "MetaData" => return Ok(meta),
            other => {
                let unexpected = error::UnexpectedElement::new("MD or /MetaData", other.summary());
                return Err(unexpected.into());
            }
        }
    }
}

fn read_metadata_entry<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<(Option<String>, Option<String>), error::MetaDataElement> {
    let mut key = None;
    let mut value = None;

    loop {
        let element = next_element::<error::MetaDataElement, _>(reader, buffer)?;
        match &element {
            Element::Start { name, .. } | Element::Empty { name, .. } if name == "Name" => {
                key = read_text_element::<error::MetaDataElement, _>(reader, buffer, &element)?
                    .map(|text| text.trim().to_string());
            }
            Element::Start { name, .. } | Element::Empty { name, .. } if name == "Value" => {
                value = read_text_element::<error::MetaDataElement, _>(reader, buffer, &element)?;
            }
            Element::End { name } if name == "MD" => return Ok((key, value)),
            other => {
                let unexpected =
                    error::UnexpectedElement::new("Name, Value or /MD", other.summary());
                return Err(unexpected.into());
            }
        }
    }
}

fn read_label_table<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<LabelTable, error::LabelTableElement> {
    let mut table = LabelTable::new();

    loop {
        match next_element::<error::LabelTableElement, _>(reader, buffer)? {
            Element::Start { name, attributes } if name == "Label" => {
                let text =
                    read_text_until_end::<error::LabelTableElement, _>(reader, buffer, "Label")?;
                table.push(parse_label(&attributes, text)?);
            }
            Element::Empty { name, attributes } if name == "Label" => {
                table.push(parse_label(&attributes, String::new())?);
            }
            Element::End { name } if name == "LabelTable" => return Ok(table),
            other => {
                let unexpected =
                    error::UnexpectedElement::new("Label or /LabelTable", other.summary());
                return Err(unexpected.into());
            }
        }
    }
}

fn parse_label(
    attributes: &[(String, String)],
    name: String,
) -> Result<Label, error::LabelTableElement> {
    // older files used `Index` for the key
    let key = match optional_attribute(attributes, "Key") {
        Some(key) => key,
        None => get_attribute_value::<error::LabelTableElement>(attributes, "Index", "Label")?,
    };
    let key: i32 = parse_attribute::<_, error::LabelTableElement>(key, "Key", "Label")?;

    let mut channels = [None; 4];
    for (channel, attribute_key) in channels.iter_mut().zip(["Red", "Green", "Blue", "Alpha"]) {
        if let Some(value) = optional_attribute(attributes, attribute_key) {
            let value: f32 = parse_attribute::<_, error::LabelTableElement>(value, attribute_key, "Label")?;
            *channel = Some(value);
        }
    }

    let color = match channels {
        [Some(red), Some(green), Some(blue), alpha] => Some([red, green, blue, alpha.unwrap_or(1.0)]),
        _ => None,
    };

    Ok(Label::new(key, name.trim(), color))
}

/// the attributes of a `<DataArray>` start tag
struct DataArrayHeader {
    intent: Intent,
    kind: ElementKind,
    order: IndexOrder,
    dims: Vec<usize>,
    encoding: Encoding,
    endian: Endian,
}

fn parse_enum<T, E>(
    attributes: &[(String, String)],
    attribute_key: &str,
    from_name: fn(&str) -> Option<T>,
) -> Result<T, E>
where
    E: From<error::MissingAttribute> + From<error::InvalidValue>,
{
    let value = get_attribute_value::<E>(attributes, attribute_key, "DataArray")?;
    from_name(value).ok_or_else(|| {
        E::from(error::InvalidValue::new(
            "DataArray".into(),
            attribute_key.into(),
            value.into(),
        ))
    })
}

fn read_data_array_header(
    attributes: &[(String, String)],
) -> Result<DataArrayHeader, error::DataArrayElement> {
    let intent = parse_enum::<_, error::DataArrayElement>(attributes, "Intent", Intent::from_name)?;
    let kind = parse_enum::<_, error::DataArrayElement>(attributes, "DataType", ElementKind::from_name)?;

    let order = match optional_attribute(attributes, "ArrayIndexingOrder") {
        Some(_) => parse_enum::<_, error::DataArrayElement>(
            attributes,
            "ArrayIndexingOrder",
            IndexOrder::from_name,
        )?,
        None => IndexOrder::default(),
    };

    let encoding = match optional_attribute(attributes, "Encoding") {
        Some(_) => parse_enum::<_, error::DataArrayElement>(attributes, "Encoding", Encoding::from_name)?,
        None => {
            log::warn!("DataArray has no Encoding attribute, assuming ASCII");
            Encoding::Ascii
        }
    };

    let endian = match optional_attribute(attributes, "Endian") {
        Some(_) => parse_enum::<_, error::DataArrayElement>(attributes, "Endian", Endian::from_name)?,
        None => Endian::default(),
    };

    let dimensionality = get_attribute_value::<error::DataArrayElement>(attributes, "Dimensionality", "DataArray")?;
    let dimensionality: usize = parse_attribute::<_, error::DataArrayElement>(
        dimensionality,
        "Dimensionality",
        "DataArray",
    )?;
    if !(1..=6).contains(&dimensionality) {
        return Err(error::InvalidValue::new(
            "DataArray".into(),
            "Dimensionality".into(),
            dimensionality.to_string(),
        )
        .into());
    }

    let mut dims = Vec::with_capacity(dimensionality);
    for axis in 0..dimensionality {
        let key = format!("Dim{axis}");
        let value = get_attribute_value::<error::DataArrayElement>(attributes, &key, "DataArray")?;
        dims.push(parse_attribute::<usize, error::DataArrayElement>(value, &key, "DataArray")?);
    }

    Ok(DataArrayHeader {
        intent,
        kind,
        order,
        dims,
        encoding,
        endian,
    })
}

/// read a `<DataArray>` element whose start (or empty) tag was just consumed
fn read_data_array<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    attributes: &[(String, String)],
    empty: bool,
) -> Result<DataArray, ParseError> {
    let header = read_data_array_header(attributes)?;

    match header.encoding {
        Encoding::Ascii | Encoding::Base64Binary => {}
        other => {
            return Err(error::DataArrayElement::from(error::UnsupportedEncoding::new(
                other.name().into(),
            ))
            .into())
        }
    }

    let mut meta = MetaData::new();
    let mut transforms = Vec::new();
    let mut text = String::new();

    if !empty {
        loop {
            match next_element::<error::DataArrayElement, _>(reader, buffer)? {
                Element::Start { name, .. } if name == "MetaData" => {
                    meta = read_metadata_body(reader, buffer)?;
                }
                Element::Empty { name, .. } if name == "MetaData" => {}
                Element::Start { name, .. } if name == "CoordinateSystemTransformMatrix" => {
                    transforms.push(read_transform(reader, buffer)?);
                }
                Element::Start { name, .. } if name == "Data" => {
                    text = read_text_until_end::<error::DataArrayElement, _>(reader, buffer, "Data")?;
                }
                Element::Empty { name, .. } if name == "Data" => {}
                Element::End { name } if name == "DataArray" => break,
                other => {
                    let unexpected = error::UnexpectedElement::new(
                        "MetaData, CoordinateSystemTransformMatrix, Data or /DataArray",
                        other.summary(),
                    );
                    return Err(error::DataArrayElement::from(unexpected).into());
                }
            }
        }
    }

    let data = decode_data(&text, &header)?;

    let mut array = DataArray::from_bytes(
        header.intent,
        header.kind,
        header.order,
        header.dims,
        header.endian,
        data,
    );
    array.encoding = header.encoding;
    array.meta = meta;
    array.transforms = transforms;

    Ok(array)
}

fn decode_data(text: &str, header: &DataArrayHeader) -> Result<Vec<u8>, error::DataArrayElement> {
    let data = match header.encoding {
        Encoding::Ascii => codec::decode_ascii(text, header.kind, header.endian).map_err(|bad| {
            error::InvalidValue::new("Data".into(), format!("value {}", bad.index), bad.token)
        })?,
        Encoding::Base64Binary => codec::decode_base64(text)?,
        other => {
            return Err(error::UnsupportedEncoding::new(other.name().into()).into());
        }
    };

    let expected = header
        .dims
        .iter()
        .try_fold(header.kind.byte_width(), |acc, dim| acc.checked_mul(*dim))
        .unwrap_or(usize::MAX);

    if data.len() != expected {
        return Err(error::DataLength::new(
            header.kind.name().into(),
            format!("{:?}", header.dims),
            expected,
            data.len(),
        )
        .into());
    }

    Ok(data)
}

fn read_transform<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<CoordTransform, error::DataArrayElement> {
    let mut data_space = XformSpace::Unknown;
    let mut transformed_space = XformSpace::Unknown;
    let mut matrix = None;

    loop {
        let element = next_element::<error::DataArrayElement, _>(reader, buffer)?;
        match &element {
            Element::Start { name, .. } | Element::Empty { name, .. } if name == "DataSpace" => {
                let text = read_text_element::<error::DataArrayElement, _>(reader, buffer, &element)?;
                data_space = parse_space(text.as_deref().unwrap_or_default());
            }
            Element::Start { name, .. } | Element::Empty { name, .. }
                if name == "TransformedSpace" =>
            {
                let text = read_text_element::<error::DataArrayElement, _>(reader, buffer, &element)?;
                transformed_space = parse_space(text.as_deref().unwrap_or_default());
            }
            Element::Start { name, .. } if name == "MatrixData" => {
                let text =
                    read_text_until_end::<error::DataArrayElement, _>(reader, buffer, "MatrixData")?;
                matrix = Some(parse_matrix(&text)?);
            }
            Element::End { name } if name == "CoordinateSystemTransformMatrix" => break,
            other => {
                let unexpected = error::UnexpectedElement::new(
                    "DataSpace, TransformedSpace, MatrixData or /CoordinateSystemTransformMatrix",
                    other.summary(),
                );
                return Err(unexpected.into());
            }
        }
    }

    let matrix = matrix.ok_or_else(|| {
        error::MissingAttribute::new("CoordinateSystemTransformMatrix".into(), "MatrixData".into())
    })?;

    Ok(CoordTransform::new(data_space, transformed_space, matrix))
}

fn parse_space(name: &str) -> XformSpace {
    XformSpace::from_name(name).unwrap_or_else(|| {
        log::warn!("unknown transform space `{}`, using NIFTI_XFORM_UNKNOWN", name.trim());
        XformSpace::Unknown
    })
}

fn parse_matrix(text: &str) -> Result<Affine, error::InvalidValue> {
    let invalid = || error::InvalidValue::new("MatrixData".into(), "values".into(), text.trim().into());

    let values = text
        .split_ascii_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    Array2::from_shape_vec((4, 4), values).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Gifti, ParseError> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);
        let mut buffer = Vec::new();
        read_document(&mut reader, &mut buffer)
    }

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE GIFTI SYSTEM "http://www.nitrc.org/frs/download.php/115/gifti.dtd">
<GIFTI Version="1.0" NumberOfDataArrays="1">
  <MetaData>
    <MD>
      <Name><![CDATA[UserName]]></Name>
      <Value><![CDATA[somebody]]></Value>
    </MD>
    <MD>
      <Name>Date</Name>
      <Value/>
    </MD>
  </MetaData>
  <LabelTable>
    <Label Key="0" Red="0" Green="0" Blue="0" Alpha="0"><![CDATA[unknown]]></Label>
    <Label Index="7" Red="1" Green="0.5" Blue="0">cortex</Label>
    <Label Key="9"/>
  </LabelTable>
  <DataArray Intent="NIFTI_INTENT_SHAPE"
             DataType="NIFTI_TYPE_FLOAT32"
             ArrayIndexingOrder="RowMajorOrder"
             Dimensionality="1"
             Dim0="3"
             Encoding="ASCII"
             Endian="LittleEndian"
             ExternalFileName=""
             ExternalFileOffset="">
    <MetaData>
      <MD><Name>Name</Name><Value>thickness</Value></MD>
    </MetaData>
    <Data>1.5 2 -3</Data>
  </DataArray>
</GIFTI>"#;

    #[test]
    fn minimal_document() {
        let gifti = parse(MINIMAL).unwrap();

        assert_eq!(gifti.version, "1.0");
        assert_eq!(gifti.meta.get_str("UserName"), Some("somebody"));
        assert_eq!(gifti.meta.get_str("Date"), Some(""));

        assert_eq!(gifti.labels.len(), 3);
        let labels: Vec<_> = gifti.labels.iter().collect();
        assert_eq!(labels[0].color, Some([0.0, 0.0, 0.0, 0.0]));
        assert_eq!(labels[1].key, 7);
        assert_eq!(labels[1].name, "cortex");
        assert_eq!(labels[1].color, Some([1.0, 0.5, 0.0, 1.0]));
        assert_eq!(labels[2].name, "");
        assert_eq!(labels[2].color, None);

        assert_eq!(gifti.arrays.len(), 1);
        let array = &gifti.arrays[0];
        assert_eq!(array.intent, Intent::Shape);
        assert_eq!(array.encoding, Encoding::Ascii);
        assert_eq!(array.name(), Some("thickness"));
        assert_eq!(array.get(2, 0).unwrap(), -3.0);
    }

    #[test]
    fn big_endian_base64_column_major() {
        let values: [i32; 4] = [1, 2, 3, 4];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        let text = format!(
            r#"<GIFTI Version="1.0" NumberOfDataArrays="1">
<DataArray Intent="NIFTI_INTENT_TRIANGLE" DataType="NIFTI_TYPE_INT32"
  ArrayIndexingOrder="ColumnMajorOrder" Dimensionality="2" Dim0="2" Dim1="2"
  Encoding="Base64Binary" Endian="BigEndian">
<Data>{}</Data>
</DataArray>
</GIFTI>"#,
            base64::encode(&bytes)
        );

        let gifti = parse(&text).unwrap();
        let array = &gifti.arrays[0];
        assert_eq!(array.endian, Endian::Big);
        assert_eq!(array.order, IndexOrder::ColumnMajor);
        // column major: the first column is stored first
        assert_eq!(array.get(0, 1).unwrap(), 3.0);
        assert_eq!(array.get(1, 0).unwrap(), 2.0);
    }

    #[test]
    fn coordinate_transform() {
        let text = r#"<GIFTI Version="1.0">
<DataArray Intent="NIFTI_INTENT_POINTSET" DataType="NIFTI_TYPE_FLOAT32"
  Dimensionality="2" Dim0="1" Dim1="3" Encoding="ASCII">
<CoordinateSystemTransformMatrix>
  <DataSpace><![CDATA[NIFTI_XFORM_UNKNOWN]]></DataSpace>
  <TransformedSpace><![CDATA[NIFTI_XFORM_TALAIRACH]]></TransformedSpace>
  <MatrixData>
    1 0 0 10
    0 1 0 20
    0 0 1 30
    0 0 0 1
  </MatrixData>
</CoordinateSystemTransformMatrix>
<Data>0 0 0</Data>
</DataArray>
</GIFTI>"#;

        let gifti = parse(text).unwrap();
        let transform = &gifti.arrays[0].transforms[0];
        assert_eq!(transform.data_space, XformSpace::Unknown);
        assert_eq!(transform.transformed_space, XformSpace::Talairach);
        assert_eq!(transform.matrix[[1, 3]], 20.0);
    }

    #[test]
    fn wrong_root_element() {
        let err = parse("<VTKFile></VTKFile>").unwrap_err();
        assert!(matches!(err, ParseError::Header(error::Header::UnexpectedElement(_))));
    }

    #[test]
    fn short_data() {
        let text = r#"<GIFTI Version="1.0">
<DataArray Intent="NIFTI_INTENT_SHAPE" DataType="NIFTI_TYPE_FLOAT32"
  Dimensionality="1" Dim0="4" Encoding="ASCII"><Data>1 2 3</Data></DataArray>
</GIFTI>"#;

        let err = parse(text).unwrap_err();
        assert!(matches!(
            err,
            ParseError::DataArray(error::DataArrayElement::DataLength(_))
        ));
    }

    #[test]
    fn unsupported_encoding() {
        let text = r#"<GIFTI Version="1.0">
<DataArray Intent="NIFTI_INTENT_SHAPE" DataType="NIFTI_TYPE_FLOAT32"
  Dimensionality="1" Dim0="1" Encoding="GZipBase64Binary"><Data>AAAA</Data></DataArray>
</GIFTI>"#;

        let err = parse(text).unwrap_err();
        assert!(matches!(
            err,
            ParseError::DataArray(error::DataArrayElement::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn bad_label_key() {
        let text = r#"<GIFTI Version="1.0"><LabelTable><Label Key="x">a</Label></LabelTable></GIFTI>"#;
        let err = parse(text).unwrap_err();
        assert!(matches!(
            err,
            ParseError::LabelTable(error::LabelTableElement::InvalidValue(_))
        ));
    }
}
