//! Canned assistant replies used when the generation service fails. The
//! match order is part of the contract: help, write, dashboard, ai, then the
//! generic text.

const WRITE_TIPS: &str = "Here are some writing tips:\n\n\
    • Start with a compelling headline\n\
    • Use short paragraphs for readability\n\
    • Include relevant images\n\
    • End with a call-to-action\n\
    • Use our AI suggestions for improvement!";

const DASHBOARD_TOUR: &str = "Your dashboard shows:\n\n\
    • Your published and draft posts\n\
    • Writing statistics\n\
    • Profile management\n\
    • AI writing tools\n\n\
    Need help with any specific feature?";

const AI_FEATURES: &str = "Our AI features include:\n\n\
    • Headline suggestions\n\
    • Content improvement\n\
    • SEO keyword generation\n\
    • Content summaries\n\n\
    Try them when creating or editing posts!";

pub fn fallback_response(user_name: &str, message: &str) -> String {
    let lower = message.to_lowercase();
    if lower.contains("help") {
        return format!(
            "Hi {user_name}! I can help you with:\n\n\
             • Writing better blog posts\n\
             • Using AI features for content creation\n\
             • Navigating the platform\n\
             • Tips for engaging content\n\n\
             What would you like to know more about?"
        );
    }
    if lower.contains("write") {
        return WRITE_TIPS.to_string();
    }
    if lower.contains("dashboard") {
        return DASHBOARD_TOUR.to_string();
    }
    if lower.contains("ai") {
        return AI_FEATURES.to_string();
    }
    format!(
        "Thanks for your message, {user_name}! I'm having some technical difficulties \
         right now, but I'm here to help with writing, platform navigation, and content \
         creation. What specific area would you like assistance with?"
    )
}

#[cfg(test)]
mod fallback_tests {
    use super::*;

    #[test]
    fn each_keyword_selects_its_response() {
        assert!(fallback_response("Ada", "I need some help").starts_with("Hi Ada!"));
        assert!(fallback_response("Ada", "how do I WRITE better").contains("writing tips"));
        assert!(fallback_response("Ada", "where is my dashboard?").contains("dashboard shows"));
        assert!(fallback_response("Ada", "what can the ai do").contains("AI features include"));
    }

    #[test]
    fn first_matching_keyword_wins() {
        // Contains both "help" and "ai"; "help" is checked first.
        let reply = fallback_response("Ada", "help me with ai stuff");
        assert!(reply.starts_with("Hi Ada!"));
        // Contains both "write" and "dashboard"; "write" is checked first.
        let reply = fallback_response("Ada", "write from the dashboard");
        assert!(reply.contains("writing tips"));
    }

    #[test]
    fn unmatched_messages_get_the_generic_text() {
        let reply = fallback_response("Ada", "tell me about pricing");
        assert!(reply.starts_with("Thanks for your message, Ada!"));
    }
}
