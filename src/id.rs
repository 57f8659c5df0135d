use serde::{Deserialize, Deserializer};

/// Project-scoped issue number (`iid`), the one users write as `#123`.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct IssueIid {
    value: u64,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct ProjectId {
    value: u64,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct LabelId {
    value: u64,
}

impl IssueIid {
    pub fn new(id: u64) -> Self { Self { value: id } }
}

impl ProjectId {
    pub fn new(id: u64) -> Self { Self { value: id } }
}

impl LabelId {
    pub fn new(id: u64) -> Self { Self { value: id } }

    pub fn value(&self) -> u64 { self.value }
}

impl From<u64> for IssueIid {
    fn from(value: u64) -> Self { Self::new(value) }
}

impl<'de> Deserialize<'de> for IssueIid {
    fn deserialize<D>(deserializer: D) -> Result<IssueIid, D::Error>
        where D: Deserializer<'de>,
    {
        let id = u64::deserialize(deserializer)?;
        Ok(IssueIid::new(id))
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D>(deserializer: D) -> Result<ProjectId, D::Error>
        where D: Deserializer<'de>,
    {
        let id = u64::deserialize(deserializer)?;
        Ok(ProjectId::new(id))
    }
}

impl<'de> Deserialize<'de> for LabelId {
    fn deserialize<D>(deserializer: D) -> Result<LabelId, D::Error>
        where D: Deserializer<'de>,
    {
        let id = u64::deserialize(deserializer)?;
        Ok(LabelId::new(id))
    }
}

impl std::fmt::Display for IssueIid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for LabelId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
