//! Type aliases

use crate::model::param::Parameter;

/// `typedef <parameter> name;`
#[derive(Clone, Debug, PartialEq)]
pub struct Typedef {
    name: String,
    number: u32,
    parameter: Parameter,
}

impl Typedef {
    pub(crate) fn new(name: String, number: u32, parameter: Parameter) -> Self {
        Self {
            name,
            number,
            parameter,
        }
    }

    #[must_use]
    pub fn get_name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn get_number(&self) -> u32 {
        self.number
    }

    /// The aliased parameter, without the typedef attached
    #[must_use]
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }
}
