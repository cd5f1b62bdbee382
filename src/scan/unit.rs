/// One bundle read from disk, waiting to be classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    data: Vec<u8>,
    name: String,
}

impl Unit {
    pub fn new(data: Vec<u8>, name: impl Into<String>) -> Self {
        Self {
            data,
            name: name.into(),
        }
    }

    /// Raw bundle bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Source name, printed at the end of every message for this bundle
    pub fn name(&self) -> &str {
        &self.name
    }
}
