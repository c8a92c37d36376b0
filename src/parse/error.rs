use super::event_summary::EventSummary;

use derive_more::{Constructor, Display, From};

#[derive(Debug, thiserror::Error, From)]
pub enum ParseError {
    #[error("Error parsing the <GIFTI> element: {0}")]
    Header(Header),
    #[error("Error parsing a <MetaData> element: {0}")]
    MetaData(MetaDataElement),
    #[error("Error parsing the <LabelTable> element: {0}")]
    LabelTable(LabelTableElement),
    #[error("Error parsing a <DataArray> element: {0}")]
    DataArray(DataArrayElement),
}

#[derive(Debug, thiserror::Error, From)]
pub enum Header {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
}

#[derive(Debug, thiserror::Error, From)]
pub enum MetaDataElement {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
}

#[derive(Debug, thiserror::Error, From)]
pub enum LabelTableElement {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    MissingAttribute(MissingAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    InvalidValue(InvalidValue),
}

#[derive(Debug, thiserror::Error, From)]
pub enum DataArrayElement {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    MissingAttribute(MissingAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    InvalidValue(InvalidValue),
    #[error("{0}")]
    UnsupportedEncoding(UnsupportedEncoding),
    #[error("{0}")]
    DataLength(DataLength),
    #[error("failed to decode base64 data: {0}")]
    Base64(base64::DecodeError),
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml element: {xml_err}")]
pub struct MalformedXml {
    xml_err: quick_xml::Error,
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml attribute: {att_err}")]
pub struct MalformedAttribute {
    att_err: quick_xml::events::attributes::AttrError,
}

#[derive(Display, Debug)]
#[display(fmt = "unexpected element. Expected `{expected_name}`, got {actual_element}")]
pub struct UnexpectedElement {
    expected_name: String,
    actual_element: EventSummary,
}

impl UnexpectedElement {
    pub(crate) fn new<T: Into<String>>(expected_name: T, actual_element: EventSummary) -> Self {
        Self {
            expected_name: expected_name.into(),
            actual_element,
        }
    }
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "missing attribute `{attribute_name}` in {element_name} element")]
pub struct MissingAttribute {
    element_name: String,
    attribute_name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "value `{value}` of {attribute_name} in {element_name} element is not valid")]
pub struct InvalidValue {
    element_name: String,
    attribute_name: String,
    value: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "data arrays with encoding `{encoding}` are not supported")]
pub struct UnsupportedEncoding {
    encoding: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "<Data> of a {kind} array with dimensions {dims} holds {actual} bytes, expected {expected}")]
pub struct DataLength {
    kind: String,
    dims: String,
    expected: usize,
    actual: usize,
}
