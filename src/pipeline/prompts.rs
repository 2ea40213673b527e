//! Prompt construction for the two generation stages.

use crate::pipeline::types::{CallerNotes, SentimentLabel};

/// Build the sentiment-classification prompt.
pub fn build_sentiment_prompt(notes: &CallerNotes) -> String {
    format!(
        "Classify the following cold call notes as one of the following sentiment labels:\n\
         - Positive\n\
         - Neutral / Follow-up Required\n\
         - Negative\n\n\
         Notes:\n\
         {notes}\n\n\
         Return only the label and reason."
    )
}

/// Build the action-recommendation prompt.
pub fn build_action_prompt(notes: &CallerNotes, sentiment: &SentimentLabel) -> String {
    format!(
        "You are a sales assistant for a streaming data platform.\n\n\
         The following are notes from a recent cold call:\n\
         \"{notes}\"\n\n\
         Sentiment label: {sentiment}\n\n\
         Based on this:\n\
         - If the sentiment label is \"Positive\":\n  \
           - Carefully read the caller notes and write a step-by-step sales outreach plan \
         customised to them. Make it ready to use.\n\n\
         - If the sentiment label is \"Follow-up Required\" or \"Neutral\":\n  \
           - Check the caller notes.\n  \
           - If there are signs of mild interest or open-ended comments, write a step-by-step \
         sales outreach plan customised to them. Make it ready to use.\n\n\
         - If the sentiment label is \"Negative\":\n  \
           - Do not suggest any follow-up. Just say: \"No further action recommended based on \
         negative sentiment.\"\n\n\
         Respond clearly and helpfully."
    )
}
