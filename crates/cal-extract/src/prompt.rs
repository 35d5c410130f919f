//! The extraction prompt and the JSON shape the model is asked to return.

use cal_core::extract::ExtractionRequest;
use serde_json::{Value, json};

const TEMPLATE: &str = "\
You are the parser behind a personal wellness journal. Read the journal entry \
below and extract what it says about meals, mood, sleep, hydration, activity \
and habits.

Today is {CURRENT_DATE} and the entry was written at {CURRENT_TIME}. \
Yesterday was {PREVIOUS_DATE}. Set \"date\" to the day the entry describes: \
use {PREVIOUS_DATE} when it talks about yesterday or last night, otherwise \
{CURRENT_DATE}.

Rules:
- Answer with a single JSON object that follows the schema below and nothing \
else.
- Leave a field as an empty string when the entry does not mention it. Never \
invent data.
- Keep descriptions short and factual, in the writer's own words.
- `supplements` is a list of supplement names, one per element.
- Set \"meaningful\" to false when the entry contains no wellness information \
at all (greetings, questions, unrelated text).

Schema:
{JSON_SCHEMA}

Journal entry:
{USER_INPUT}
";

/// The JSON object the model must answer with.
pub fn response_schema() -> Value {
  json!({
    "date": "YYYY-MM-DD",
    "meaningful": true,
    "meals": {
      "breakfast": "",
      "lunch": "",
      "dinner": "",
      "snack": ""
    },
    "mood": {
      "morning": "",
      "afternoon": "",
      "night": ""
    },
    "habits": {
      "hydration": "",
      "sleep": "",
      "activity": "",
      "exercise_type": "",
      "alcohol": "",
      "caffeine": "",
      "marijuana": "",
      "supplements": []
    },
    "notes": ""
  })
}

/// Render the prompt for one extraction request.
pub fn build_prompt(request: &ExtractionRequest) -> String {
  let schema = serde_json::to_string_pretty(&response_schema())
    .unwrap_or_else(|_| response_schema().to_string());

  TEMPLATE
    .replace("{CURRENT_DATE}", &request.today.format("%Y-%m-%d").to_string())
    .replace("{PREVIOUS_DATE}", &request.yesterday.format("%Y-%m-%d").to_string())
    .replace("{CURRENT_TIME}", &request.now.to_rfc3339())
    .replace("{JSON_SCHEMA}", &schema)
    .replace("{USER_INPUT}", &request.text)
}
