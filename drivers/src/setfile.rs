use crate::error;

/// Residency of loaded entries is tracked in a 64-bit mask.
pub const MAX_ENTRIES: usize = 64;

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Entry {
    pub address: u64,
    pub size: u32,
}

/// Tuning blobs of one sensor position.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SetfileTable {
    pub version: u32,
    pub entries: Vec<Entry>,
    /// Scenario to entry index.
    pub index: Vec<u32>,
    pub using_count: usize,
}

impl SetfileTable {
    pub fn deserialize_bincode(data: &[u8]) -> bincode::Result<SetfileTable> {
        bincode::deserialize(data)
    }

    pub fn validate(&self) -> Result<(), error::Error> {
        if self.using_count > self.entries.len() {
            return Err(error::Error::InvalidSetfile(format!(
                "{} entries in use but only {} provided",
                self.using_count,
                self.entries.len()
            )));
        }
        if self.using_count > MAX_ENTRIES {
            return Err(error::Error::InvalidSetfile(format!(
                "{} entries in use, at most {MAX_ENTRIES} are supported",
                self.using_count
            )));
        }
        Ok(())
    }

    pub fn resolve(&self, scenario: usize) -> Result<usize, error::Error> {
        let index = *self
            .index
            .get(scenario)
            .ok_or(error::Error::OutOfRange {
                index: scenario,
                limit: self.index.len(),
            })? as usize;
        if index >= self.using_count {
            return Err(error::Error::OutOfRange {
                index,
                limit: self.using_count,
            });
        }
        Ok(index)
    }
}
