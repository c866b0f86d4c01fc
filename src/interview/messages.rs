use super::config::InterviewSettings;

/// Text logged for an explicit help request
pub const HELP_REQUEST: &str = "I need help with this question";

pub fn welcome(settings: &InterviewSettings, max_questions: usize) -> String {
    format!(
        "Hello {name}! Welcome to your {kind} interview for the {role} position at {company}. \
         I'm your AI interviewer, and I'm excited to get to know you better today. \
         This will be a {difficulty} level interview where I'll ask you {max_questions} questions. \
         I'll ask a question, then you can take your time to think and respond. \
         Feel free to ask for clarification or a hint at any point. \
         Are you ready to begin? Let's start with our first question.",
        name = settings.candidate_name,
        kind = settings.interview_type,
        role = settings.role,
        company = settings.company,
        difficulty = settings.difficulty,
    )
}

/// Congratulatory closing after the full question budget
pub fn closing(settings: &InterviewSettings, max_questions: usize) -> String {
    format!(
        "Excellent work, {name}! We've completed all {max_questions} questions for your {role} interview at {company}. \
         Thank you for walking me through your thinking today. \
         Keep practicing, stay curious, and trust in your abilities. \
         Best of luck with your interview at {company}!",
        name = settings.candidate_name,
        role = settings.role,
        company = settings.company,
    )
}

/// Closing when the candidate ends the interview before the budget is used
pub fn early_closing(settings: &InterviewSettings) -> String {
    format!(
        "Thank you for your time today, {name}. I understand you need to end the interview early. \
         Every interview is a learning experience, and you're on the right path. \
         Keep practicing, and best of luck with {company} or wherever your search takes you.",
        name = settings.candidate_name,
        company = settings.company,
    )
}

/// Spoken after several turns with nothing said
pub fn reprompt(question: &str) -> String {
    format!(
        "Take your time. Whenever you're ready, I'd love to hear your thoughts on this one: {question} \
         You can also ask me for a hint."
    )
}
