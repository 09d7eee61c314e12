use crate::chat::graph::DialogueGraph;
use crate::chat::node::DialogueNode;
use crate::chat::script::ScriptError;
use crate::chat::wellness::{WellnessScript, WellnessSection};

// ---------------------------------------------------------------------------
// Canned lines
// ---------------------------------------------------------------------------

/// Said when a non wrap-up terminal node is reached, or a transition points
/// at a node that does not exist.
pub const FILLER: &str = "Thanks for sharing 💬";

pub const CHECK_IN_ACCEPTED: &str = "Alright 💬 Let’s start your quick wellness check.";

pub const CHECK_IN_INSTRUCTIONS: &str = "Answer 'Yes' or 'No' to each question.";

pub const CHECK_IN_DECLINED: &str = "No worries 💛 I’m here if you just want to talk.";

pub const CHECK_IN_COMPLETE: &str =
    "That was the last section ✅ Thank you for completing the wellness check.";

pub const SCORING_FAILED: &str = "Error connecting to backend.";

/// Words at the wrap-up node that mean "yes, start the check-in".
pub const OPT_IN_KEYWORDS: [&str; 2] = ["yes", "check"];

pub fn section_intro(section_name: &str) -> String {
    format!("Let's talk about {section_name} next.")
}

pub fn question_line(section_name: &str, question: &str) -> String {
    format!("{section_name} — {question}")
}

/// Sent, in order, whenever a trigger term shows up in a message.
pub const CRISIS_RESPONSE: [&str; 3] = [
    "It sounds like you might be going through something difficult. You’re not alone 💛",
    "If you or someone you know is struggling with substance use, free and confidential help \
     is available 24/7 from the SAMHSA National Helpline at **1-800-662-4357**.",
    "You can also look for treatment options at [FindTreatment.gov](https://findtreatment.gov). \
     If you are in immediate danger, please call 911, or call or text **988**.",
];

// ---------------------------------------------------------------------------
// Trigger terms
// ---------------------------------------------------------------------------

/// Lower-case substrings that short-circuit the conversation. Short slang
/// that hides inside everyday words ("meth" in "something", "pot" in "spot")
/// is left out on purpose.
pub fn sensitive_terms() -> Vec<String> {
    [
        "weed",
        "marijuana",
        "cannabis",
        "heroin",
        "cocaine",
        "crack pipe",
        "fentanyl",
        "methamphetamine",
        "crystal meth",
        "opioid",
        "oxycodone",
        "oxycontin",
        "percocet",
        "xanax",
        "ketamine",
        "ecstasy",
        "mdma",
        "shrooms",
        "overdose",
        "get high",
        "getting high",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// ---------------------------------------------------------------------------
// Icebreaker graph
// ---------------------------------------------------------------------------

pub fn icebreaker_graph() -> Result<DialogueGraph, ScriptError> {
    let nodes = vec![
        DialogueNode::decision(
            "icebreaker1",
            "Hey there! How are you feeling today?",
            &[
                ("good", "icebreaker2"),
                ("fine", "icebreaker2"),
                ("great", "icebreaker2"),
            ],
            "followup1",
        ),
        DialogueNode::decision(
            "icebreaker2",
            "Glad to hear that 😊! How has your week been so far?",
            &[],
            "followup2",
        ),
        DialogueNode::decision(
            "followup1",
            "I’m sorry to hear that. What’s been on your mind lately?",
            &[],
            "followup2",
        ),
        DialogueNode::decision(
            "followup2",
            "When you’re stressed or upset, what do you usually do to feel better?",
            &[
                ("friends", "followup3_friends"),
                ("alone", "followup3_alone"),
            ],
            "followup3_generic",
        ),
        DialogueNode::decision(
            "followup3_friends",
            "That’s great that you have supportive friends! Do you ever feel like they influence your habits or choices?",
            &[],
            "wrapup",
        ),
        DialogueNode::decision(
            "followup3_alone",
            "It sounds like you prefer handling things on your own. Does that ever get overwhelming?",
            &[],
            "wrapup",
        ),
        DialogueNode::decision(
            "followup3_generic",
            "That’s one way to handle it. Has that been helping you lately?",
            &[],
            "wrapup",
        ),
        DialogueNode::terminal(
            "wrapup",
            "Thanks for sharing that. Would you like to keep chatting or take a quick mental wellness check?",
        ),
    ];

    DialogueGraph::new("icebreaker1", "wrapup", nodes)
}

// ---------------------------------------------------------------------------
// Wellness check-in
// ---------------------------------------------------------------------------

pub fn wellness_script() -> Result<WellnessScript, ScriptError> {
    let section = |name: &str, questions: &[&str]| WellnessSection {
        name: name.into(),
        questions: questions.iter().map(|q| (*q).into()).collect(),
    };

    WellnessScript::new(vec![
        section(
            "Social Isolation",
            &[
                "Have you intentionally withdrawn from social activities or friends recently?",
                "Do you frequently feel isolated or alone, even when you are with others?",
                "Are you spending significantly more time by yourself than you used to?",
                "Have you started avoiding family gatherings or social events?",
            ],
        ),
        section(
            "Financial Issues",
            &[
                "Have you experienced financial difficulties or debt directly related to your habit?",
                "Are you frequently running out of money because of the cost of your addiction?",
                "Do you spend money on your addiction instead of essential items like food or tuition?",
            ],
        ),
        section(
            "Physical & Mental Health",
            &[
                "Have you noticed a decline in your overall physical health since your habit started?",
                "Are you experiencing new or worsening mental health issues like anxiety or depression?",
                "Do you often feel sick, exhausted, or unwell because of your substance use?",
            ],
        ),
        section(
            "Relationship Strain",
            &[
                "Has your addiction caused frequent arguments or conflicts with family members or friends?",
                "Do you find yourself lying to or hiding your activities from the people you care about?",
                "Are your relationships becoming strained or damaged by your behavior?",
            ],
        ),
        section(
            "Withdrawal Symptoms",
            &[
                "When you stop using your habit, do you experience physical discomfort or sickness?",
                "Do you get anxious or restless if you cannot engage in your habit?",
                "Do you need to use the substance just to feel 'normal'?",
            ],
        ),
        section(
            "Risk-Taking Behavior",
            &[
                "Have you engaged in dangerous or reckless activities while under the influence?",
                "Do you take significant risks to obtain the substance or engage in your habit?",
                "Have you ever had an accident directly related to your substance use?",
            ],
        ),
    ])
}
