//! Console output for assessments and notification plans.

use dosewarden_contracts::assessment::DoseAssessment;
use dosewarden_core::notify::{render_flag, Channel, NotificationPlan};

pub fn print_assessment(assessment: &DoseAssessment) {
    let patient = assessment.patient();
    println!("  Patient:      {}", patient.patient_id);
    if let Some(indication) = assessment.indication() {
        println!("  Indication:   {}", indication.text);
    }
    for order in assessment.medications() {
        println!("  Order:        {}", order.describe());
    }
    for order in assessment.co_medications() {
        println!("  Co-med:       {}", order.describe());
    }
    println!(
        "  Max severity: {}",
        assessment.max_severity().map(|s| s.as_str()).unwrap_or("none")
    );
    println!();

    if assessment.flags().is_empty() {
        println!("  No dosing issues found.");
        println!();
        return;
    }
    for flag in assessment.flags() {
        for line in render_flag(flag).lines() {
            println!("  {}", line);
        }
        println!();
    }
}

pub fn print_plan(plan: &NotificationPlan) {
    println!("  Notification tier: {:?}", plan.tier);
    if plan.is_empty() {
        println!("  (no immediate notification)");
    }
    for leg in &plan.legs {
        let channel = match leg.channel {
            Channel::Messaging => "messaging",
            Channel::Email => "email",
        };
        println!("  -> {} to {}: {}", channel, leg.destination, leg.subject);
    }
    println!();
}
