use serde::{Deserialize, Serialize};

/// Backend data type code for a column, as reported in `UIDataType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum DataType {
    #[default]
    Text,
    Integer,
    Float,
    Boolean,
    Date,
}

impl From<u8> for DataType {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::Integer,
            2 => Self::Float,
            5 => Self::Boolean,
            6 => Self::Date,
            _ => Self::Text,
        }
    }
}

impl From<DataType> for u8 {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::Text => 0,
            DataType::Integer => 1,
            DataType::Float => 2,
            DataType::Boolean => 5,
            DataType::Date => 6,
        }
    }
}

/// Category that drives operator selection and value validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    Text,
    EnumerableText,
    Integer,
    Float,
    Boolean,
    Date,
}

impl DataCategory {
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Boolean and date columns are edited through fixed controls, so an
    /// empty value is never reported for them.
    #[must_use]
    pub const fn supplies_own_value(self) -> bool {
        matches!(self, Self::Boolean | Self::Date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnDescriptor {
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(rename = "UIDataType", default)]
    pub ui_data_type: DataType,

    #[serde(default)]
    pub has_enumerable_options: bool,

    #[serde(default)]
    pub is_sortable: bool,

    #[serde(default)]
    pub is_groupable: bool,

    #[serde(default)]
    pub supports_aggregate_functions: bool,

    #[serde(default = "default_true")]
    pub display_in_filters: bool,

    #[serde(default = "default_true")]
    pub display_in_results: bool,
}

fn default_true() -> bool {
    true
}

impl ColumnDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, ui_data_type: DataType) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            ui_data_type,
            has_enumerable_options: false,
            is_sortable: true,
            is_groupable: true,
            supports_aggregate_functions: matches!(
                ui_data_type,
                DataType::Integer | DataType::Float
            ),
            display_in_filters: true,
            display_in_results: true,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    #[must_use]
    pub fn enumerable(mut self) -> Self {
        self.has_enumerable_options = true;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, sortable: bool, groupable: bool) -> Self {
        self.is_sortable = sortable;
        self.is_groupable = groupable;
        self
    }

    #[must_use]
    pub fn hidden_from_results(mut self) -> Self {
        self.display_in_results = false;
        self
    }

    /// Shown in results and usable in an order-by list.
    #[must_use]
    pub fn can_sort(&self) -> bool {
        self.is_sortable && self.display_in_results
    }

    /// Shown in results and usable as a crosstab row or column variable.
    #[must_use]
    pub fn can_group(&self) -> bool {
        self.is_groupable && self.display_in_results
    }

    #[must_use]
    pub fn category(&self) -> DataCategory {
        match self.ui_data_type {
            DataType::Text if self.has_enumerable_options => DataCategory::EnumerableText,
            DataType::Text => DataCategory::Text,
            DataType::Integer => DataCategory::Integer,
            DataType::Float => DataCategory::Float,
            DataType::Boolean => DataCategory::Boolean,
            DataType::Date => DataCategory::Date,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableMetadata {
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub column_descriptors: Vec<ColumnDescriptor>,
}

impl TableMetadata {
    #[must_use]
    pub fn new(name: impl Into<String>, column_descriptors: Vec<ColumnDescriptor>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            column_descriptors,
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.column_descriptors
            .iter()
            .find(|descriptor| descriptor.name == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in table order, each listed once.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.column_descriptors.len());
        for descriptor in &self.column_descriptors {
            if !names.contains(&descriptor.name) {
                names.push(descriptor.name.clone());
            }
        }
        names
    }

    pub fn output_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.column_descriptors
            .iter()
            .filter(|descriptor| descriptor.display_in_results)
    }

    pub fn sort_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.column_descriptors
            .iter()
            .filter(|descriptor| descriptor.can_sort())
    }

    pub fn grouping_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.column_descriptors
            .iter()
            .filter(|descriptor| descriptor.can_group())
    }

    /// Columns eligible as the subject of a numeric crosstab function.
    pub fn aggregate_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.column_descriptors
            .iter()
            .filter(|descriptor| descriptor.supports_aggregate_functions)
            .filter(|descriptor| descriptor.display_in_filters)
    }
}

/// One entry of a column's distinct-value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListOption {
    pub label: String,
    pub value: String,
}

impl ListOption {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}
