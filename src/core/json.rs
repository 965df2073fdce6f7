use crate::core::resolver::QueryResult;
use serde::{Deserialize, Serialize, Serializer};

/*-------------------------------------------------------------------------------------------------
  JSON Data Structures
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  JSON Query Result
--------------------------------------------------------------------------------------*/

/// Wire shape of a [QueryResult]: all three fields for a match, only `AS_description`
/// (carrying a placeholder) otherwise.
#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JsonQueryResult<'j> {
    #[serde(rename = "AS_number", skip_serializing_if = "Option::is_none", default)]
    pub as_number: Option<u32>,

    #[serde(borrow, skip_serializing_if = "Option::is_none", default)]
    pub country_code: Option<&'j str>,

    #[serde(rename = "AS_description")]
    pub as_description: &'j str,
}

impl<'j> From<&'j QueryResult> for JsonQueryResult<'j> {
    fn from(result: &'j QueryResult) -> Self {
        match result {
            QueryResult::Found(as_info) => JsonQueryResult {
                as_number: Some(as_info.as_number),
                country_code: Some(as_info.country_code.as_str()),
                as_description: &as_info.description,
            },
            _ => JsonQueryResult {
                as_number: None,
                country_code: None,
                as_description: result.description(),
            },
        }
    }
}

impl Serialize for QueryResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        JsonQueryResult::from(self).serialize(serializer)
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
