//! The standard team: the software-pipeline roles wired to their actions,
//! triggers, and declared context dependencies.

use std::sync::Arc;

use crate::action::{ActionKind, ActionSpec, LlmAction};
use crate::prompts;
use crate::provider::TextGenerator;
use crate::role::Role;
use crate::schema::{FieldKind, OutputSchema};

pub const PRD_FIELDS: &[(&str, FieldKind)] = &[
    ("Project name", FieldKind::Text),
    ("Requirements", FieldKind::Text),
    ("User stories", FieldKind::List),
];

pub const DESIGN_FIELDS: &[(&str, FieldKind)] = &[
    ("Implementation approach", FieldKind::Text),
    ("File list", FieldKind::List),
    ("Data structures", FieldKind::Text),
];

pub const TASK_FIELDS: &[(&str, FieldKind)] = &[
    ("Task list", FieldKind::List),
    ("Shared knowledge", FieldKind::Text),
];

/// Watches the boss requirement, writes the PRD.
pub fn product_manager(generator: Arc<dyn TextGenerator>) -> Role {
    Role::new("Alice", "Product Manager").with_action(ActionSpec::new(
        ActionKind::WritePrd,
        vec![ActionKind::Requirement],
        vec![ActionKind::Requirement],
        Box::new(
            LlmAction::new(generator, prompts::WRITE_PRD)
                .with_schema(OutputSchema::new(PRD_FIELDS)),
        ),
    ))
}

/// Watches the PRD, writes the system design.
pub fn architect(generator: Arc<dyn TextGenerator>) -> Role {
    Role::new("Max", "Architect").with_action(ActionSpec::new(
        ActionKind::WriteDesign,
        vec![ActionKind::WritePrd],
        vec![ActionKind::WritePrd],
        Box::new(
            LlmAction::new(generator, prompts::WRITE_DESIGN)
                .with_schema(OutputSchema::new(DESIGN_FIELDS)),
        ),
    ))
}

/// Watches the design, writes the task breakdown.
pub fn project_manager(generator: Arc<dyn TextGenerator>) -> Role {
    Role::new("Paul", "Project Manager").with_action(ActionSpec::new(
        ActionKind::WriteTasks,
        vec![ActionKind::WriteDesign],
        vec![ActionKind::WriteDesign],
        Box::new(
            LlmAction::new(generator, prompts::WRITE_TASKS)
                .with_schema(OutputSchema::new(TASK_FIELDS)),
        ),
    ))
}

/// Watches the task list; codes against the design *and* the tasks — the
/// two declared dependencies — never the whole transcript.
pub fn engineer(generator: Arc<dyn TextGenerator>) -> Role {
    Role::new("Alex", "Engineer").with_action(ActionSpec::new(
        ActionKind::WriteCode,
        vec![ActionKind::WriteTasks],
        vec![ActionKind::WriteDesign, ActionKind::WriteTasks],
        Box::new(LlmAction::new(generator, prompts::WRITE_CODE)),
    ))
}

/// Watches the code, writes the tests.
pub fn qa_engineer(generator: Arc<dyn TextGenerator>) -> Role {
    Role::new("Edward", "QA Engineer").with_action(ActionSpec::new(
        ActionKind::WriteTest,
        vec![ActionKind::WriteCode],
        vec![ActionKind::WriteCode],
        Box::new(LlmAction::new(generator, prompts::WRITE_TEST)),
    ))
}

/// The five pipeline roles in order: PM, architect, project manager,
/// engineer, QA.
pub fn standard_team(generator: Arc<dyn TextGenerator>) -> Vec<Role> {
    vec![
        product_manager(generator.clone()),
        architect(generator.clone()),
        project_manager(generator.clone()),
        engineer(generator.clone()),
        qa_engineer(generator),
    ]
}
