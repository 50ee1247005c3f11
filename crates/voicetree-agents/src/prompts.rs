//! Prompt templates
//!
//! Plain `{placeholder}` templates rendered by string substitution. The
//! response format is enforced separately by the provider-native response
//! schema; the JSON shape in each prompt is there to anchor the model.

/// Substitute `{key}` placeholders.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

pub const SEGMENTATION_PROMPT: &str = "\
You are processing a live speech transcript. Split the new transcript text \
into segments, where each segment is one atomic idea: a single thought that \
could stand alone as a note.

Earlier transcript, already processed (context only, do not segment it):
{transcript_history}

New transcript text to segment:
{transcript_text}

Rules:
- Preserve the speaker's wording. Each segment's `text` is a contiguous, \
verbatim span of the new transcript text; together the segments cover all \
of it, in order.
- Mark a segment `is_complete: false` only when the speaker was cut off \
mid-thought. That can only happen to the final segment.
- Filler words belong to the segment they introduce.

Respond with JSON:
{\"segments\": [{\"reasoning\": \"...\", \"text\": \"...\", \"is_complete\": true}]}";

pub const PLACEMENT_PROMPT: &str = "\
You are filing segments of dictated speech into a knowledge tree. For each \
segment below, decide whether it continues an existing node or starts a new \
one.

{existing_nodes}

Earlier transcript for context:
{transcript_history}

Segments to place (in order):
{segments}

For each segment, in the same order, emit one placement:
- APPEND when the segment adds detail to an existing node shown above. Set \
`target_node_id` to that node's id. Only ids shown above are valid.
- CREATE when no shown node fits. Set `new_node_name` (1-5 words) and a \
one-sentence `summary`. If the new idea clearly belongs under a shown node, \
set `parent_node_id` to that id and `relationship` to a short phrase from \
the new node's perspective (e.g. \"subtask of\"); otherwise leave both out \
and the node becomes a root.

Respond with JSON:
{\"placements\": [{\"reasoning\": \"...\", \"action\": \"APPEND\", \"target_node_id\": 1}]}";

pub const OPTIMIZER_PROMPT: &str = "\
You maintain a knowledge tree where every node holds exactly one \
abstraction: one idea at one level of detail. The node below was just \
modified. Judge whether it still holds a single coherent idea.

Node {node_id}: {title}
Summary: {summary}
Content:
{content}

Neighbors:
{neighbors}

If the node is fine, return an empty `actions` list. Otherwise return, in \
order, any of:
- UPDATE with `new_content` and `new_summary` to rewrite the node for \
clarity or to remove duplicated material.
- CREATE with `new_node_name`, `content`, `summary` and `relationship` to \
split a distinct sub-idea out into a child of this node. When you split, \
also UPDATE this node so the split-out material is not stated twice.

Keep the speaker's meaning. Do not invent information.

Respond with JSON:
{\"reasoning\": \"...\", \"actions\": []}";

pub const CONNECT_ORPHANS_PROMPT: &str = "\
The knowledge tree below has accumulated disconnected root nodes. Group \
roots that clearly belong to one theme under a new parent node. Only group \
when the relationship is obvious from titles and summaries; leave unrelated \
roots alone. Each grouping needs at least {min_group_size} roots.

Root nodes:
{roots_context}

For each grouping, return the exact titles of the member roots, a \
`parent_title` and `parent_summary` for the new parent, and a \
`relationship` phrase such as \"is a category of\". Return an empty \
`groupings` list when nothing should be grouped.

Respond with JSON:
{\"reasoning\": \"...\", \"groupings\": []}";
