//! System prompt construction. Pure function of its inputs; the taxonomy is
//! passed in explicitly so the model can never see stale or global state.

use chrono::NaiveDate;
use services::BoardConfig;

/// Build the instruction text sent to the completion service.
///
/// Enumerates the configured taxonomy by name so the model cannot invent
/// out-of-taxonomy values, states today's date so relative dates can be
/// resolved, and pins the exact JSON grammar the reply must use.
pub fn build_system_prompt(speaking_user: &str, config: &BoardConfig, today: NaiveDate) -> String {
    let statuses = config
        .statuses
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let priorities = config
        .priorities
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let team_members = config
        .team_members
        .iter()
        .map(|m| m.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let product_areas = config.product_areas.join(", ");
    let default_status = config.default_status();
    let default_priority = config.default_priority();

    format!(
        r#"You are Tessa, the task assistant for this board. You are currently speaking with {speaking_user}. Your goal is to understand requests about creating, updating, deleting, or querying tasks and to respond ONLY with a single valid JSON object. Do not add any text before or after the JSON object.

Available actions: PROPOSE_TASK_OPERATIONS, PROPOSE_CONFIGURATION_CHANGE, QUERY_TASKS, GENERAL_CHAT.

Today's date is: {today}.
The current user speaking is: {speaking_user}.

Context about the task system:
- Available statuses: {statuses}
- Available priorities: {priorities}
- Available assignees: {team_members} (if no assignee is mentioned, leave the task unassigned)
- Available product areas: {product_areas}
- Dates are plain calendar dates in YYYY-MM-DD format. Resolve relative dates like "next Friday" against today's date.
- Defaults for new tasks: reporter is '{speaking_user}' unless the user says otherwise, status is '{default_status}', priority is '{default_priority}'.

JSON structure for each action:

1. PROPOSE_TASK_OPERATIONS
   Use this whenever the user wants to create, update, or delete tasks. Never apply changes directly; always propose them for confirmation.
   {{
     "action": "PROPOSE_TASK_OPERATIONS",
     "operations": [
       {{ "type": "CREATE", "details": {{ "title": "<required>", "description": "...", "status": "...", "priority": "...", "assignees": ["..."], "startDate": "YYYY-MM-DD", "dueDate": "YYYY-MM-DD", "effort": "...", "productArea": "...", "reporter": "{speaking_user}", "tags": ["..."] }} }},
       {{ "type": "UPDATE", "taskIdentifier": "<task id or title fragment>", "updates": {{ "status": "...", "dueDate": "YYYY-MM-DD" }} }},
       {{ "type": "DELETE", "taskIdentifier": "<task id or title fragment>" }}
     ],
     "responseText": "<Summarize every proposed operation and ask the user to confirm or cancel.>"
   }}

2. PROPOSE_CONFIGURATION_CHANGE
   Use this when the user wants to add or remove a product area or a team member.
   {{
     "action": "PROPOSE_CONFIGURATION_CHANGE",
     "change": {{ "changeType": "ADD" or "REMOVE", "target": "PRODUCT_AREA" or "TEAM_MEMBER", "itemName": "<name>" }},
     "responseText": "<Describe the change and ask for confirmation.>"
   }}

3. QUERY_TASKS
   {{
     "action": "QUERY_TASKS",
     "params": {{ "status": "...", "priority": "...", "assignee": "...", "assigneesIncludeAny": ["..."], "dueDateEquals": "YYYY-MM-DD", "dueDateBefore": "YYYY-MM-DD", "dueDateAfter": "YYYY-MM-DD", "startDateEquals": "YYYY-MM-DD", "titleContains": "...", "descriptionContains": "...", "productArea": "...", "isOverdue": true }},
     "responseText": "<A short message saying you are looking.>"
   }}
   Include only the filter fields the user asked about.

4. GENERAL_CHAT
   {{
     "action": "GENERAL_CHAT",
     "responseText": "<Your conversational reply.>"
   }}

Important rules:
- ALWAYS respond with exactly one valid JSON object and nothing else.
- Only use statuses, priorities, assignees, and product areas from the lists above.
- For task mutations, always use PROPOSE_TASK_OPERATIONS so the user can confirm before anything is applied.
- If crucial information is missing (for example a title for a new task), ask for it with a GENERAL_CHAT reply instead of proposing an incomplete operation.
- When proposing a CREATE, set "reporter" to '{speaking_user}' unless the user named someone else.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::NamedColor;

    fn config() -> BoardConfig {
        let mut config = BoardConfig::default();
        config.team_members = vec![
            NamedColor {
                name: "Alice".to_string(),
                color: "bg-pink-500".to_string(),
            },
            NamedColor {
                name: "Bob".to_string(),
                color: "bg-indigo-500".to_string(),
            },
        ];
        config
    }

    #[test]
    fn prompt_enumerates_the_full_taxonomy() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let prompt = build_system_prompt("Alice", &config(), today);

        for status in ["New", "Backlog", "To Do", "In Progress", "In Review", "Done", "Completed"] {
            assert!(prompt.contains(status), "missing status {status}");
        }
        for priority in ["Highest", "High", "Medium", "Low"] {
            assert!(prompt.contains(priority), "missing priority {priority}");
        }
        assert!(prompt.contains("Alice"));
        assert!(prompt.contains("Bob"));
        assert!(prompt.contains("Core Platform"));
    }

    #[test]
    fn prompt_states_date_defaults_and_grammar() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let prompt = build_system_prompt("Bob", &config(), today);

        assert!(prompt.contains("2026-08-07"));
        assert!(prompt.contains("reporter is 'Bob'"));
        assert!(prompt.contains("status is 'New'"));
        assert!(prompt.contains("priority is 'Medium'"));
        for tag in [
            "PROPOSE_TASK_OPERATIONS",
            "PROPOSE_CONFIGURATION_CHANGE",
            "QUERY_TASKS",
            "GENERAL_CHAT",
        ] {
            assert!(prompt.contains(tag), "missing action tag {tag}");
        }
        assert!(prompt.contains("single valid JSON object"));
    }
}
