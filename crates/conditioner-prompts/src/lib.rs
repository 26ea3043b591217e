//! Prompt builder (C6): composes the system/user turn pair the generator
//! sends to C1. Favors imitation over instruction (§4.6 "Rationale
//! (binding)") — the system prompt leads with real community examples and a
//! short persona, not a checklist of meta-instructions.

use conditioner_blacklist::PromptBlacklistEntry;
use conditioner_gating::GateConstraint;
use conditioner_types::{Archetype, CommunityProfile};

/// §4.6: target size for the system turn is ≈1,500 characters; this crate
/// enforces only the hard bound below, dropping the least-relevant example
/// once it's crossed.
const SYSTEM_MAX_CHARS: usize = 2_500;
const MAX_EXAMPLES: usize = 3;

/// Curated generic human-written examples, used when no profile exists yet
/// (§4.6: "fall back to three curated generic human-written examples").
const GENERIC_EXAMPLES: [&str; 3] = [
    "Spent the last two weekends rebuilding my morning routine from scratch. \
     Didn't expect it to actually stick this time, but three weeks in and it's still going.",
    "Anyone else feel like the advice everyone gives is the opposite of what actually worked for them? \
     Took me a while to realize that and stop copying other people's playbooks.",
    "Finally got unstuck on something I'd been avoiding for months. Wasn't the breakthrough I pictured, \
     just a lot of small, unglamorous fixes stacked on top of each other.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub system: String,
    pub user: String,
}

/// §4.6 contract. `profile` may be absent (no analyzed community yet);
/// `user_context` is the caller-supplied free-text steer, if any.
///
/// The profile carries no full post bodies (§4.4 only stores
/// `top_success_hooks`, the first 1-2 sentences of the top posts), so those
/// hooks double as the "complete real example posts" this contract calls
/// for — the only real community text the profile makes available.
#[must_use]
pub fn build(
    profile: Option<&CommunityProfile>,
    archetype: Archetype,
    blacklist_entries: &[PromptBlacklistEntry],
    constraints: &[GateConstraint],
    user_context: Option<&str>,
) -> BuiltPrompt {
    let system = build_system(profile);
    let user = build_user(archetype, blacklist_entries, constraints, user_context);
    BuiltPrompt { system, user }
}

fn build_system(profile: Option<&CommunityProfile>) -> String {
    let mut examples: Vec<String> = match profile {
        Some(p) if !p.top_success_hooks.is_empty() => p.top_success_hooks.iter().take(MAX_EXAMPLES).cloned().collect(),
        _ => GENERIC_EXAMPLES.iter().map(|s| (*s).to_string()).collect(),
    };

    let persona = persona_paragraph(profile);
    let style_block = style_data_block(profile);

    loop {
        let system = assemble_system(&examples, &persona, &style_block);
        if system.len() <= SYSTEM_MAX_CHARS || examples.len() <= 1 {
            return system;
        }
        examples.pop();
    }
}

fn assemble_system(examples: &[String], persona: &str, style_block: &str) -> String {
    let mut parts = Vec::new();
    parts.push("Here's how people in this community actually write:".to_string());
    for (i, example) in examples.iter().enumerate() {
        parts.push(format!("Example {}: {}", i + 1, example));
    }
    parts.push(persona.to_string());
    parts.push(style_block.to_string());
    parts.join("\n\n")
}

fn persona_paragraph(profile: Option<&CommunityProfile>) -> String {
    match profile {
        Some(p) => format!(
            "Write like a real member of r/{}, not a marketer or an assistant. Match the tone and pacing above, not a generic helpful register.",
            p.subreddit
        ),
        None => "Write like a real community member, not a marketer or an assistant.".to_string(),
    }
}

fn style_data_block(profile: Option<&CommunityProfile>) -> String {
    match profile {
        Some(p) => format!(
            "Tone: {}. Formality: {}. Typical sentence length: {:.0} words.",
            p.dominant_tone,
            formality_description(p.formality_level),
            p.avg_sentence_length
        ),
        None => "Tone: casual. Formality: informal. Typical sentence length: 15 words.".to_string(),
    }
}

fn formality_description(level: f64) -> &'static str {
    if level < 0.3 {
        "very informal"
    } else if level < 0.6 {
        "informal"
    } else if level < 0.8 {
        "moderately formal"
    } else {
        "formal"
    }
}

fn build_user(
    archetype: Archetype,
    blacklist_entries: &[PromptBlacklistEntry],
    constraints: &[GateConstraint],
    user_context: Option<&str>,
) -> String {
    let mut lines = vec![archetype_directive(archetype)];

    if let Some(context) = user_context {
        lines.push(format!("Context: {context}"));
    }

    if !blacklist_entries.is_empty() {
        let names: Vec<&str> = blacklist_entries.iter().map(|e| e.forbidden_pattern.as_str()).collect();
        lines.push(format!("Avoid these patterns: {}", names.join(", ")));
    }

    for constraint in constraints {
        lines.push(constraint_directive(constraint));
    }

    lines.join("\n")
}

fn archetype_directive(archetype: Archetype) -> String {
    match archetype {
        Archetype::Journey => "Write a personal journey/progress-update post.".to_string(),
        Archetype::ProblemSolution => "Write a problem-then-solution post.".to_string(),
        Archetype::Feedback | Archetype::Unclassified => "Write a feedback-seeking, conversational post.".to_string(),
    }
}

fn constraint_directive(constraint: &GateConstraint) -> String {
    match constraint {
        GateConstraint::NoLinks => "Do not include any links.".to_string(),
        GateConstraint::NoPitch => "Do not pitch or promote anything.".to_string(),
        GateConstraint::MaxVulnerability(cap) => format!("Keep vulnerability/self-disclosure below {cap:.1}."),
        GateConstraint::ZeroLinks => "Include zero links.".to_string(),
        GateConstraint::PainToSolutionRatio(ratio) => {
            format!("Devote at least {:.0}% of the post to the pain point before any solution.", ratio * 100.0)
        }
        GateConstraint::ProductMentionOnlyLast10Pct => "Only mention the product, if at all, in the final 10% of the post.".to_string(),
        GateConstraint::InMediaResOpening => "Open in media res, mid-situation, not with setup.".to_string(),
        GateConstraint::RequireNumericMilestones => "Include concrete numeric milestones or timeframes.".to_string(),
        GateConstraint::InvertAuthority => "Write from a position of seeking input, not giving advice.".to_string(),
        GateConstraint::ControlledImperfection => "Allow some imperfection in phrasing; don't over-polish.".to_string(),
    }
}
