/// Generates fresh index names of the form `dbaas_<uuid>`.
#[derive(Debug, Clone)]
pub struct IndexNamer {
    default_prefix: String,
    delimiter: String,
}

impl IndexNamer {
    pub fn new() -> Self {
        Self {
            default_prefix: "dbaas".to_string(),
            delimiter: "_".to_string(),
        }
    }

    /// A unique name under the default prefix.
    pub fn name_index(&self) -> String {
        format!("{}{}{}", self.default_prefix, self.delimiter, uuid::Uuid::new_v4())
    }

    /// A unique prefix to put in front of existing names, delimiter included.
    pub fn unique_prefix(&self) -> String {
        format!("{}{}", self.name_index(), self.delimiter)
    }
}

impl Default for IndexNamer {
    fn default() -> Self {
        Self::new()
    }
}
