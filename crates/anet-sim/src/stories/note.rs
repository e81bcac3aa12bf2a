//! Note stories

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use super::{mutate, uuid_of, ListQuery, StoryArgs, StoryOutcome, StoryRunnable};
use crate::error::StoryError;
use crate::gateway::SimContext;
use crate::kinds::NoteTarget;
use crate::lorem;
use crate::probability::GrowGate;
use crate::users::SimUser;

const CREATE_NOTE: &str = "mutation ($note: NoteInput!) { createNote(note: $note) { uuid } }";

/// Note body attached to one related object
pub fn free_text_note(target: NoteTarget, related_uuid: &str, text: String) -> Value {
    json!({
        "type": "FREE_TEXT",
        "text": text,
        "noteRelatedObjects": [{
            "relatedObjectType": target.related_object_type(),
            "relatedObjectUuid": related_uuid,
        }],
    })
}

/// Attach a free text note to a random object
///
/// Arguments: `relatedObjectType`, one of the [`NoteTarget`] names; reports
/// by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateNote;

#[async_trait]
impl StoryRunnable for CreateNote {
    async fn run(
        &self,
        ctx: &SimContext,
        user: &SimUser,
        _gate: &GrowGate,
        args: &StoryArgs,
    ) -> Result<StoryOutcome, StoryError> {
        let cred = user.credential();
        let target = args
            .get::<NoteTarget>("relatedObjectType")
            .unwrap_or(NoteTarget::Reports);
        let related = ListQuery::new(target.list_query(), target.query_input())
            .random(ctx, &cred, &json!({}), "uuid")
            .await?;
        let Some(related_uuid) = related.as_ref().and_then(uuid_of) else {
            return Ok(StoryOutcome::Nop(format!(
                "no {} to attach a note to",
                target.related_object_type()
            )));
        };
        let note = free_text_note(target, related_uuid, lorem::paragraph(&mut StdRng::from_entropy()));
        mutate(ctx, &cred, CREATE_NOTE, "createNote", json!({ "note": note })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_links_the_related_object() {
        let note = free_text_note(NoteTarget::People, "p-1", "hello".into());
        assert_eq!(note["noteRelatedObjects"][0]["relatedObjectType"], json!("people"));
        assert_eq!(note["noteRelatedObjects"][0]["relatedObjectUuid"], json!("p-1"));
        assert_eq!(note["text"], json!("hello"));
    }
}
