//! Terminal output formatting.

use std::collections::HashMap;

use colored::{ColoredString, Colorize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use sphere_core::insights::{Community, ContactPath, GraphStatistics};
use sphere_core::{Contact, OrganizationNode, RelationshipEdge, RelationshipType, SyncReport};

pub fn print_sync_report(report: &SyncReport) {
    println!("  Imported:        {}", report.imported.to_string().green());
    println!("  Updated:         {}", report.updated);
    if report.removed > 0 {
        println!("  Removed:         {}", report.removed.to_string().yellow());
    }
    if report.discarded > 0 {
        println!("  Discarded:       {}", report.discarded.to_string().dimmed());
    }
    println!("  Pages:           {}", report.pages);
    println!("  Relationships:   {}", report.edges);
    println!("  Total contacts:  {}", report.total_contacts.to_string().bold());
    match &report.sync_token {
        Some(token) => println!("  Sync token:      {}", truncate(token, 40).dimmed()),
        None => println!("  Sync token:      {}", "none".dimmed()),
    }
}

/// Print contacts as a table.
pub fn print_contacts_table(contacts: &[Contact]) {
    if contacts.is_empty() {
        println!("{}", "No contacts found.".dimmed());
        return;
    }

    println!(
        "{} {} {} {}",
        pad_right("ID", 14),
        pad_right("Name", 26),
        pad_right("Organization", 24),
        "City"
    );
    println!("{}", "─".repeat(80));

    for contact in contacts {
        let name = pad_right(&truncate(&contact.name, 24), 26);
        let name = if contact.uncategorized { name.dimmed() } else { name.normal() };
        println!(
            "{} {} {} {}",
            pad_right(&truncate(&contact.id, 12), 14).dimmed(),
            name,
            pad_right(&truncate(contact.organization.as_deref().unwrap_or("-"), 22), 24),
            contact.city.as_deref().unwrap_or("-")
        );
    }

    println!();
    println!("{} contact(s) total", contacts.len());
}

/// Print a single contact.
pub fn print_contact(contact: &Contact, verbose: bool) {
    println!("{} {}", contact.name.cyan().bold(), format!("({})", contact.id).dimmed());
    if contact.uncategorized {
        println!("{}", "uncategorized".yellow());
    }
    println!();

    let fields = [
        ("Email", contact.email.as_deref()),
        ("Phone", contact.phone.as_deref()),
        ("Organization", contact.organization.as_deref()),
        ("Previous org", contact.previous_organization.as_deref()),
        ("School", contact.school.as_deref()),
        ("Address", contact.address.as_deref()),
        ("City", contact.city.as_deref()),
        ("Country", contact.country.as_deref()),
        ("Birthday", contact.birthday.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{}: {}", label.bold(), value);
        }
    }

    if !contact.tags.is_empty() {
        let tags: Vec<&str> = contact.tags.iter().map(String::as_str).collect();
        println!("{}: {}", "Tags".bold(), tags.join(", ").cyan());
    }
    if !contact.notes.is_empty() {
        println!();
        println!("{}", "Notes".bold());
        println!("{}", contact.notes);
    }

    if verbose && !contact.raw_data.is_null() {
        println!();
        println!("{}", "Raw record".bold());
        println!(
            "{}",
            serde_json::to_string_pretty(&contact.raw_data).unwrap_or_default().dimmed()
        );
    }
}

/// Print edges with contact names resolved.
pub fn print_edges_table(edges: &[RelationshipEdge], contacts: &[Contact]) {
    if edges.is_empty() {
        println!("{}", "No relationships found.".dimmed());
        return;
    }

    let names: HashMap<&str, &str> = contacts.iter().map(|c| (c.id.as_str(), c.name.as_str())).collect();
    let name_of = |id: &str| names.get(id).copied().unwrap_or(id).to_string();

    println!("{} {} {} {}", pad_right("Type", 16), pad_right("Contact", 24), pad_right("Contact", 24), "Shared");
    println!("{}", "─".repeat(80));

    for edge in edges {
        let label = pad_right(edge.relationship_type.as_str(), 16);
        let shared = edge
            .metadata
            .get(edge.relationship_type.metadata_key())
            .map(String::as_str)
            .unwrap_or("");
        println!(
            "{} {} {} {}",
            type_colored(edge.relationship_type, label),
            pad_right(&truncate(&name_of(&edge.source_id), 22), 24),
            pad_right(&truncate(&name_of(&edge.target_id), 22), 24),
            shared.dimmed()
        );
    }

    println!();
    println!("{} relationship(s) total", edges.len());
}

pub fn print_statistics(stats: &GraphStatistics) {
    println!("{} {}", "Contacts:".bold(), stats.contact_count);
    println!("{} {}", "Relationships:".bold(), stats.relationship_count);
    println!("{} {}", "Uncategorized:".bold(), stats.uncategorized_count);

    if !stats.relationship_types.is_empty() {
        println!();
        println!("{}", "By type".bold());
        for (rel_type, count) in &stats.relationship_types {
            println!("  {} {}", pad_right(rel_type, 16), count);
        }
    }

    if !stats.top_connected.is_empty() {
        println!();
        println!("{}", "Most connected".bold());
        for (i, contact) in stats.top_connected.iter().enumerate() {
            println!(
                "  {}. {} {}",
                i + 1,
                pad_right(&truncate(&contact.name, 30), 32),
                contact.connections.to_string().cyan()
            );
        }
    }
}

pub fn print_path(path: &ContactPath) {
    let mut line = String::new();
    for (i, node) in path.nodes.iter().enumerate() {
        if i > 0 {
            let rel = path.relationships.get(i - 1).map(String::as_str).unwrap_or("?");
            line.push_str(&format!(" -[{}]- ", rel));
        }
        line.push_str(&node.name);
    }
    println!("{}", line);
    println!("{}", format!("{} hop(s)", path.relationships.len()).dimmed());
}

pub fn print_communities(communities: &[Community]) {
    if communities.is_empty() {
        println!("{}", "No communities found.".dimmed());
        return;
    }

    for community in communities {
        println!("{} {}", community.name.cyan().bold(), format!("({})", community.size).dimmed());
        for member in &community.members {
            println!("  {} {}", "→".dimmed(), member.name);
        }
    }
}

pub fn print_organizations(organizations: &[OrganizationNode]) {
    if organizations.is_empty() {
        println!("{}", "No organizations found.".dimmed());
        return;
    }

    println!("{} {} {}", pad_right("ID", 30), pad_right("Name", 30), "Contacts");
    println!("{}", "─".repeat(70));
    for org in organizations {
        println!(
            "{} {} {}",
            pad_right(&truncate(&org.id, 28), 30).dimmed(),
            pad_right(&truncate(&org.name, 28), 30),
            org.employee_count
        );
    }
}

fn type_colored(rel_type: RelationshipType, label: String) -> ColoredString {
    match rel_type {
        RelationshipType::Colleague => label.blue(),
        RelationshipType::Local => label.green(),
        RelationshipType::CountryMate => label.cyan(),
        RelationshipType::DomainMate => label.magenta(),
        RelationshipType::Alumni => label.yellow(),
        RelationshipType::BirthdayBuddy => label.red(),
    }
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 2 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Bartholomew Smith", 8), "Bartho..");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each CJK character is two columns wide.
        let out = truncate("山田太郎さん", 7);
        assert_eq!(out, "山田..");
        assert!(UnicodeWidthStr::width(out.as_str()) <= 7);
    }

    #[test]
    fn test_pad_right_uses_visual_width() {
        assert_eq!(pad_right("é", 3), "é  ");
        assert_eq!(pad_right("山", 4), "山  ");
        assert_eq!(pad_right("toolong", 3), "toolong");
    }
}
