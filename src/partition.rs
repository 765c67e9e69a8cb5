use crate::error::SynthesisError;

/// Partition of the atomic propositions into environment inputs and
/// controller outputs, typically loaded from a `.part` file.
///
/// The file format is line oriented: a line `.inputs: x1 x2 ...` lists
/// environment atoms and a line `.outputs: y1 y2 ...` lists controller
/// atoms. Empty lines and lines starting with `#` are ignored; repeated
/// section lines accumulate. The two sets must be disjoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl Partition {
    /// Create a partition from explicit atom lists.
    ///
    /// Fails with `InvalidArgument` if an atom repeats within a list or
    /// appears in both lists.
    pub fn new(inputs: Vec<String>, outputs: Vec<String>) -> Result<Self, SynthesisError> {
        for (index, name) in inputs.iter().enumerate() {
            if inputs[..index].contains(name) {
                return Err(SynthesisError::InvalidArgument(format!(
                    "atom `{}` listed twice among the inputs",
                    name
                )));
            }
        }
        for (index, name) in outputs.iter().enumerate() {
            if outputs[..index].contains(name) {
                return Err(SynthesisError::InvalidArgument(format!(
                    "atom `{}` listed twice among the outputs",
                    name
                )));
            }
            if inputs.contains(name) {
                return Err(SynthesisError::InvalidArgument(format!(
                    "atom `{}` listed as both an input and an output",
                    name
                )));
            }
        }
        Ok(Partition { inputs, outputs })
    }

    /// Parse a partition from a string in the `.part` file format.
    pub fn parse(input: &str) -> Result<Self, SynthesisError> {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();

        for (line_num, line) in input.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(rest) = line.strip_prefix(".inputs:") {
                inputs.extend(rest.split_whitespace().map(String::from));
                continue;
            }

            if let Some(rest) = line.strip_prefix(".outputs:") {
                outputs.extend(rest.split_whitespace().map(String::from));
                continue;
            }

            return Err(SynthesisError::Parse(format!(
                "Line {}: Unrecognized line format: {}",
                line_num + 1,
                line
            )));
        }

        Partition::new(inputs, outputs)
    }

    /// Parse a partition from a file.
    pub fn parse_file(path: impl AsRef<std::path::Path>) -> Result<Self, SynthesisError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SynthesisError::Parse(format!("Failed to read file: {}", e)))?;
        Self::parse(&content)
    }

    /// Environment atoms, in file order.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Controller atoms, in file order.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Check if an atom is an environment input.
    pub fn is_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|n| n == name)
    }

    /// Check if an atom is a controller output.
    pub fn is_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|n| n == name)
    }

    /// Check if an atom appears in either list.
    pub fn contains(&self, name: &str) -> bool {
        self.is_input(name) || self.is_output(name)
    }

    /// Total number of partitioned atoms.
    pub fn len(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    /// Check if the partition is empty.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    /// Swap the two sides of the partition; used for game dualization.
    pub fn dual(&self) -> Partition {
        Partition {
            inputs: self.outputs.clone(),
            outputs: self.inputs.clone(),
        }
    }
}
