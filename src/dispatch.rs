//! Typed boundary between the dashboard and the queries.
//!
//! The dashboard calls a query by name with a positional JSON argument list,
//! e.g. `name_year_count` with `["Maria", {"year_min": 2000, "year_max": null}, 101]`.
//! Arguments are decoded once into a [`QueryRequest`]; trailing arguments may
//! be omitted and `null` means "not set".

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::data::filter::{DistrictCountBounds, FilterSpec, MaxBounds, YearRange};
use crate::data::model::{DistrictValue, NamesDataset};
use crate::query::{
    district_choropleth, ranked_name_table, rarity_scatter, year_trend, DistrictChoropleth,
    RankedName, RarityPoint, YearTrend,
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown query function '{0}'")]
    UnknownFunction(String),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("'{0}' expects a JSON array of arguments")]
    NotAnArray(&'static str),
    #[error("'{function}' takes at most {max} arguments, got {got}")]
    TooManyArguments {
        function: &'static str,
        max: usize,
        got: usize,
    },
    #[error("'{function}' is missing required argument '{argument}'")]
    MissingArgument {
        function: &'static str,
        argument: &'static str,
    },
    #[error("'{function}' argument '{argument}' is invalid: {source}")]
    InvalidArgument {
        function: &'static str,
        argument: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One decoded query call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    /// `name_count(years, district, maxes, district_counts)`
    NameCount(FilterSpec),
    /// `name_year_count(name, years, district)`
    NameYearCount { name: String, filters: FilterSpec },
    /// `name_region_rarity(years, district, maxes, district_counts)`
    NameRegionRarity(FilterSpec),
    /// `name_district_count(name, years)`
    NameDistrictCount { name: String, years: Option<YearRange> },
}

/// Positional argument list of one call.
struct Args<'v> {
    function: &'static str,
    values: &'v [Value],
}

impl<'v> Args<'v> {
    fn new(function: &'static str, values: &'v [Value], max: usize) -> Result<Self, DispatchError> {
        if values.len() > max {
            return Err(DispatchError::TooManyArguments {
                function,
                max,
                got: values.len(),
            });
        }
        Ok(Self { function, values })
    }

    /// Absent and `null` arguments both decode to `None`.
    fn optional<T: DeserializeOwned>(&self, idx: usize, argument: &'static str) -> Result<Option<T>, DispatchError> {
        match self.values.get(idx) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| DispatchError::InvalidArgument {
                    function: self.function,
                    argument,
                    source,
                }),
        }
    }

    fn required<T: DeserializeOwned>(&self, idx: usize, argument: &'static str) -> Result<T, DispatchError> {
        self.optional(idx, argument)?
            .ok_or(DispatchError::MissingArgument {
                function: self.function,
                argument,
            })
    }

    fn district(&self, idx: usize) -> Result<Option<String>, DispatchError> {
        Ok(self.optional::<DistrictValue>(idx, "district")?.map(String::from))
    }

    /// `(years, district, maxes, district_counts)` starting at `first`.
    fn filters(&self, first: usize) -> Result<FilterSpec, DispatchError> {
        Ok(FilterSpec {
            years: self.optional::<YearRange>(first, "years")?,
            district: self.district(first + 1)?,
            maxes: self.optional::<MaxBounds>(first + 2, "maxes")?,
            district_counts: self.optional::<DistrictCountBounds>(first + 3, "district_counts")?,
        })
    }
}

impl QueryRequest {
    pub const FUNCTIONS: [&'static str; 4] = [
        "name_count",
        "name_year_count",
        "name_region_rarity",
        "name_district_count",
    ];

    /// Decode a call from its function name and positional arguments.
    pub fn decode(function: &str, values: &[Value]) -> Result<Self, DispatchError> {
        match function {
            "name_count" => {
                let args = Args::new("name_count", values, 4)?;
                Ok(QueryRequest::NameCount(args.filters(0)?))
            }
            "name_year_count" => {
                let args = Args::new("name_year_count", values, 3)?;
                Ok(QueryRequest::NameYearCount {
                    name: args.required(0, "name")?,
                    filters: FilterSpec {
                        years: args.optional(1, "years")?,
                        district: args.district(2)?,
                        ..FilterSpec::default()
                    },
                })
            }
            "name_region_rarity" => {
                let args = Args::new("name_region_rarity", values, 4)?;
                Ok(QueryRequest::NameRegionRarity(args.filters(0)?))
            }
            "name_district_count" => {
                let args = Args::new("name_district_count", values, 2)?;
                Ok(QueryRequest::NameDistrictCount {
                    name: args.required(0, "name")?,
                    years: args.optional(1, "years")?,
                })
            }
            other => Err(DispatchError::UnknownFunction(other.to_string())),
        }
    }

    /// Decode a call whose arguments are still a JSON string.
    pub fn from_json(function: &str, args_json: &str) -> Result<Self, DispatchError> {
        let args: Value = serde_json::from_str(args_json)?;
        Self::from_value(function, &args)
    }

    /// Decode a call whose arguments are an already parsed JSON value.
    pub fn from_value(function: &str, args: &Value) -> Result<Self, DispatchError> {
        let function_name = Self::FUNCTIONS
            .iter()
            .find(|f| **f == function)
            .copied()
            .ok_or_else(|| DispatchError::UnknownFunction(function.to_string()))?;
        match args {
            Value::Array(values) => Self::decode(function_name, values),
            Value::Null => Self::decode(function_name, &[]),
            _ => Err(DispatchError::NotAnArray(function_name)),
        }
    }

    pub fn function_name(&self) -> &'static str {
        match self {
            QueryRequest::NameCount(_) => "name_count",
            QueryRequest::NameYearCount { .. } => "name_year_count",
            QueryRequest::NameRegionRarity(_) => "name_region_rarity",
            QueryRequest::NameDistrictCount { .. } => "name_district_count",
        }
    }

    /// Run the query against the dataset.
    pub fn execute(&self, dataset: &NamesDataset) -> QueryResponse {
        match self {
            QueryRequest::NameCount(filters) => QueryResponse::NameTable(ranked_name_table(dataset, filters)),
            QueryRequest::NameYearCount { name, filters } => {
                QueryResponse::YearTrend(year_trend(dataset, name, filters))
            }
            QueryRequest::NameRegionRarity(filters) => {
                QueryResponse::Rarity(rarity_scatter(dataset, filters))
            }
            QueryRequest::NameDistrictCount { name, years } => {
                QueryResponse::Choropleth(district_choropleth(dataset, name, years.as_ref()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Query result, serialized as the bare view payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    NameTable(Vec<RankedName>),
    YearTrend(YearTrend),
    Rarity(Vec<RarityPoint>),
    Choropleth(DistrictChoropleth),
}

/// Decode, run and serialize one call.
pub fn call_fn(dataset: &NamesDataset, function: &str, args_json: &str) -> Result<String, DispatchError> {
    let request = QueryRequest::from_json(function, args_json)?;
    let response = request.execute(dataset);
    Ok(serde_json::to_string(&response)?)
}
