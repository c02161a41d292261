use crate::models::{Filter, FilterLogicType, Query, QueryType};

impl Query {
    /// Query-type-aware equality used to decide whether a query has already
    /// been run. Crosstab queries ignore paging, logic and column
    /// selections; raw queries ignore the crosstab parameters.
    #[must_use]
    pub fn is_equivalent(&self, other: &Query) -> bool {
        if self.query_type != other.query_type || !other.targets(&self.database, &self.table) {
            return false;
        }
        if !filters_match(&self.filters, &other.filters) {
            return false;
        }

        match self.query_type {
            QueryType::Crosstab => {
                self.crosstab_function == other.crosstab_function
                    && self.crosstab_subject_var == other.crosstab_subject_var
                    && self.crosstab_row_var == other.crosstab_row_var
                    && self.crosstab_col_var == other.crosstab_col_var
            }
            QueryType::Raw => {
                self.offset == other.offset
                    && self.limit == other.limit
                    && self.logic_matches(other)
                    && self.output_columns == other.output_columns
                    && self.order_by == other.order_by
            }
        }
    }

    /// MatchAll and MatchAny ignore any leftover logic text; a custom
    /// expression on either side compares by text.
    #[must_use]
    pub fn logic_matches(&self, other: &Query) -> bool {
        match (self.filter_logic_type, other.filter_logic_type) {
            (FilterLogicType::MatchAll, FilterLogicType::MatchAll)
            | (FilterLogicType::MatchAny, FilterLogicType::MatchAny) => true,
            (FilterLogicType::Custom, _) | (_, FilterLogicType::Custom) => {
                self.filter_logic_string == other.filter_logic_string
            }
            _ => false,
        }
    }
}

fn filters_match(left: &[Filter], right: &[Filter]) -> bool {
    left.len() == right.len()
        && left.iter().zip(right).all(|(ours, theirs)| {
            ours.column == theirs.column
                && ours.operator == theirs.operator
                && ours.value == theirs.value
        })
}
