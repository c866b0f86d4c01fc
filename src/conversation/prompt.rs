use super::history::ConversationTurnRecord;
use serde::Serialize;

/// Grounding handed to the language model with every conversational prompt
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewContext {
    pub company: String,
    pub role: String,
    pub interview_type: String,
    pub difficulty: String,
    pub current_question: Option<String>,
    pub question_index: usize,
    pub max_questions: usize,
    pub conversation_history: Vec<ConversationTurnRecord>,
    pub candidate_name: String,
}

const SPEECH_RULES: &str = "IMPORTANT: Your response will be read aloud by text-to-speech, so:
- DO NOT use markdown formatting (**, *, #, etc.)
- DO NOT use special characters or symbols
- Write in plain, spoken English only
- Use natural speech patterns
- Keep technical terms simple and pronounceable";

/// Prompt for an ordinary answer: acknowledge, then follow up or move on
pub fn interviewer_prompt(utterance: &str, context: &InterviewContext) -> String {
    format!(
        "You are a friendly, experienced {kind} interviewer having a natural conversation.

Context: {context}
Candidate said: \"{utterance}\"

{rules}

Respond naturally as a human interviewer would:
- Use conversational language, not formal or robotic speech
- Show genuine interest and engagement
- Give encouraging feedback
- Use \"I\", \"you\", \"we\" pronouns
- Keep responses concise (1-3 sentences max)

If the candidate gave a good answer, acknowledge it and either ask a follow-up or move to the next topic naturally.
If the answer needs improvement, guide them gently with hints.",
        kind = context.interview_type,
        context = render_context(context),
        utterance = utterance.trim(),
        rules = SPEECH_RULES,
    )
}

/// Prompt for a help request: a nudge, never the answer
pub fn help_prompt(request: &str, context: &InterviewContext) -> String {
    format!(
        "The candidate is asking for help during an interview. Be supportive and provide guidance.

Context: {context}
Candidate's help request: \"{request}\"

{rules}

Provide helpful guidance:
- Give a hint or direction without giving away the full answer
- Ask a leading question to guide their thinking
- Be encouraging and keep it conversational
- Keep it to 1-3 sentences",
        context = render_context(context),
        request = request.trim(),
        rules = SPEECH_RULES,
    )
}

fn render_context(context: &InterviewContext) -> String {
    serde_json::to_string_pretty(context).unwrap_or_else(|_| {
        format!(
            "{} interview for {} at {}",
            context.interview_type, context.role, context.company
        )
    })
}
