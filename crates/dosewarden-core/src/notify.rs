//! Severity → notification-tier mapping.
//!
//! The mapping is a pure function of an assessment's `max_severity`. Delivery
//! belongs to an external notifier; this module only decides which channels
//! a notifier should use and renders the text it should send.
//!
//! | max severity      | tier                | channels          |
//! |-------------------|---------------------|-------------------|
//! | none              | `None`              | (none)            |
//! | LOW               | `Deferred`          | (none)            |
//! | MODERATE          | `Messaging`         | messaging         |
//! | HIGH, CRITICAL    | `MessagingAndEmail` | messaging + email |

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use dosewarden_contracts::{
    assessment::{AssessmentId, DoseAssessment},
    flag::{DoseFlag, Severity},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Team chat / pager style channel.
    Messaging,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTier {
    /// No flags: nothing to send.
    None,
    /// Only LOW findings: recorded, no immediate notification.
    Deferred,
    Messaging,
    MessagingAndEmail,
}

impl NotificationTier {
    /// Channels this tier notifies, before recipient addresses are considered.
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            NotificationTier::None | NotificationTier::Deferred => &[],
            NotificationTier::Messaging => &[Channel::Messaging],
            NotificationTier::MessagingAndEmail => &[Channel::Messaging, Channel::Email],
        }
    }

    pub fn is_immediate(&self) -> bool {
        !self.channels().is_empty()
    }
}

/// Map the highest severity in an assessment to a notification tier.
pub fn notification_tier(max_severity: Option<Severity>) -> NotificationTier {
    match max_severity {
        None => NotificationTier::None,
        Some(Severity::Low) => NotificationTier::Deferred,
        Some(Severity::Moderate) => NotificationTier::Messaging,
        Some(Severity::High) | Some(Severity::Critical) => NotificationTier::MessagingAndEmail,
    }
}

/// Where a notifier should deliver alerts for one care team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Messaging destination (channel name or webhook key).
    pub messaging_channel: String,
    /// Email address. When absent the email leg is skipped.
    #[serde(default)]
    pub email: Option<String>,
}

/// One delivery the external notifier should perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLeg {
    pub channel: Channel,
    pub destination: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPlan {
    pub assessment_id: AssessmentId,
    pub tier: NotificationTier,
    pub legs: Vec<NotificationLeg>,
}

impl NotificationPlan {
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.legs.iter().map(|l| l.channel).collect()
    }
}

/// Build the delivery plan for an assessment.
///
/// A recipient without an email address simply gets no email leg.
pub fn plan_notifications(assessment: &DoseAssessment, recipient: &Recipient) -> NotificationPlan {
    let tier = notification_tier(assessment.max_severity());
    let subject = render_subject(assessment);

    let legs = tier
        .channels()
        .iter()
        .filter_map(|channel| {
            let destination = match channel {
                Channel::Messaging => recipient.messaging_channel.clone(),
                Channel::Email => recipient.email.clone()?,
            };
            let body = match channel {
                Channel::Messaging => render_messaging(assessment),
                Channel::Email => render_summary(assessment),
            };
            Some(NotificationLeg {
                channel: *channel,
                destination,
                subject: subject.clone(),
                body,
            })
        })
        .collect();

    NotificationPlan {
        assessment_id: assessment.id().clone(),
        tier,
        legs,
    }
}

// ── Rendering ────────────────────────────────────────────────────────────────

pub fn render_subject(assessment: &DoseAssessment) -> String {
    let severity = assessment
        .max_severity()
        .map(|s| s.as_str())
        .unwrap_or("NONE");
    let count = assessment.flags().len();
    format!(
        "[{}] Antimicrobial dosing review for patient {} ({} finding{})",
        severity,
        assessment.patient().patient_id,
        count,
        if count == 1 { "" } else { "s" }
    )
}

/// Multi-line text for one flag.
pub fn render_flag(flag: &DoseFlag) -> String {
    let mut out = format!("[{}] {}: {}\n", flag.severity, flag.drug, flag.flag_type);
    let _ = writeln!(out, "  {}", flag.message);
    if let Some(expected) = &flag.expected {
        let _ = writeln!(out, "  Expected: {}", expected);
    }
    if let Some(actual) = &flag.actual {
        let _ = writeln!(out, "  Actual:   {}", actual);
    }
    if let Some(indication) = &flag.indication {
        let _ = writeln!(out, "  Indication: {}", indication);
    }
    if let Some(source) = &flag.rule_source {
        let _ = writeln!(out, "  Source: {}", source);
    }
    out
}

/// Full report, one block per flag. Used for the email leg.
pub fn render_summary(assessment: &DoseAssessment) -> String {
    let mut out = render_subject(assessment);
    out.push_str("\n\n");
    if let Some(indication) = assessment.indication() {
        let _ = writeln!(out, "Indication: {}", indication.text);
    }
    let _ = writeln!(out, "Assessed at {} by {}", assessment.assessed_at().to_rfc3339(), assessment.assessed_by());
    out.push('\n');
    for flag in assessment.flags() {
        out.push_str(&render_flag(flag));
        out.push('\n');
    }
    out
}

/// Short form for chat channels: one line per flag.
pub fn render_messaging(assessment: &DoseAssessment) -> String {
    let mut out = render_subject(assessment);
    for flag in assessment.flags() {
        let _ = write!(out, "\n• [{}] {}: {}", flag.severity, flag.drug, flag.message);
    }
    out
}

#[cfg(test)]
mod tests {
    use dosewarden_contracts::{
        assessment::DoseAssessment,
        flag::{DoseFlag, FlagType, Severity},
        patient::PatientContext,
    };

    use super::*;

    fn assessment_with(severities: &[Severity]) -> DoseAssessment {
        let ctx = PatientContext::builder("p-notify").indication("sepsis").build();
        let flags = severities
            .iter()
            .enumerate()
            .map(|(i, s)| {
                DoseFlag::new(FlagType::WrongInterval, *s, format!("drug-{i}"), "interval too short")
                    .expected("q8h")
                    .actual("q4h")
                    .source("Sanford Guide")
            })
            .collect();
        DoseAssessment::assemble(&ctx, flags, "test")
    }

    fn recipient(email: Option<&str>) -> Recipient {
        Recipient {
            messaging_channel: "#asp-alerts".to_string(),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_tier_mapping_follows_severity() {
        assert_eq!(notification_tier(None), NotificationTier::None);
        assert_eq!(notification_tier(Some(Severity::Low)), NotificationTier::Deferred);
        assert_eq!(notification_tier(Some(Severity::Moderate)), NotificationTier::Messaging);
        assert_eq!(notification_tier(Some(Severity::High)), NotificationTier::MessagingAndEmail);
        assert_eq!(notification_tier(Some(Severity::Critical)), NotificationTier::MessagingAndEmail);
        assert!(!NotificationTier::Deferred.is_immediate());
    }

    #[test]
    fn test_empty_assessment_plans_nothing() {
        let plan = plan_notifications(&assessment_with(&[]), &recipient(Some("asp@example.org")));
        assert_eq!(plan.tier, NotificationTier::None);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_low_only_is_deferred() {
        let plan = plan_notifications(&assessment_with(&[Severity::Low]), &recipient(Some("asp@example.org")));
        assert_eq!(plan.tier, NotificationTier::Deferred);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_moderate_goes_to_messaging_only() {
        let plan = plan_notifications(
            &assessment_with(&[Severity::Low, Severity::Moderate]),
            &recipient(Some("asp@example.org")),
        );
        assert_eq!(plan.channels(), vec![Channel::Messaging]);
        assert_eq!(plan.legs[0].destination, "#asp-alerts");
    }

    #[test]
    fn test_high_goes_to_both_channels() {
        let plan = plan_notifications(&assessment_with(&[Severity::High]), &recipient(Some("asp@example.org")));
        assert_eq!(plan.channels(), vec![Channel::Messaging, Channel::Email]);
        assert_eq!(plan.legs[1].destination, "asp@example.org");
        assert!(plan.legs[1].body.contains("Expected: q8h"));
    }

    #[test]
    fn test_missing_email_skips_email_leg() {
        let plan = plan_notifications(&assessment_with(&[Severity::Critical]), &recipient(None));
        assert_eq!(plan.tier, NotificationTier::MessagingAndEmail);
        assert_eq!(plan.channels(), vec![Channel::Messaging]);
    }

    #[test]
    fn test_rendered_flag_carries_all_fields() {
        let flag = DoseFlag::new(FlagType::WrongRoute, Severity::Critical, "vancomycin", "IV vancomycin does not reach the colon")
            .expected("PO or PR")
            .actual("1000 mg IV q12h")
            .source("IDSA/SHEA C. difficile 2021")
            .indication(Some("c_difficile"));
        let text = render_flag(&flag);
        assert!(text.starts_with("[CRITICAL] vancomycin: WRONG_ROUTE"));
        assert!(text.contains("Expected: PO or PR"));
        assert!(text.contains("Actual:   1000 mg IV q12h"));
        assert!(text.contains("Indication: c_difficile"));
        assert!(text.contains("Source: IDSA/SHEA"));
    }

    #[test]
    fn test_subject_pluralizes() {
        let one = render_subject(&assessment_with(&[Severity::High]));
        assert!(one.contains("(1 finding)"));
        let two = render_subject(&assessment_with(&[Severity::High, Severity::Low]));
        assert!(two.contains("(2 findings)"));
        assert!(two.starts_with("[HIGH]"));
    }
}
