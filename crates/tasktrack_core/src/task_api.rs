use crate::error::AppError;
use crate::model::{Task, TaskStatus};
use crate::storage::json_store;
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// Every operation takes the store location explicitly; callers resolve
// `json_store::store_path()` once per invocation. There is no process-wide
// store singleton, which keeps tests isolated on distinct paths.

pub fn add_task(path: &Path, description: &str) -> Result<Task, AppError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("description is required"));
    }

    let mut tasks = json_store::load_tasks(path)?;
    let task = Task {
        id: next_id(&tasks),
        description: trimmed.to_string(),
        status: TaskStatus::Todo,
        created_at: now_rfc3339()?,
        updated_at: None,
    };

    tasks.push(task.clone());
    json_store::save_tasks(path, &tasks)?;

    Ok(task)
}

pub fn update_task(path: &Path, id: &str, description: &str) -> Result<Task, AppError> {
    let id = parse_id(id)?;
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("description is required"));
    }

    let mut tasks = json_store::load_tasks(path)?;
    let mut updated_task = None;

    for task in &mut tasks {
        if task.id == id {
            task.description = trimmed.to_string();
            task.updated_at = Some(now_rfc3339()?);
            updated_task = Some(task.clone());
            break;
        }
    }

    let updated = updated_task.ok_or_else(|| AppError::not_found(format!("no task with id {id}")))?;
    json_store::save_tasks(path, &tasks)?;

    Ok(updated)
}

/// Remove a task. Remaining tasks keep their order and their ids; ids are
/// never renumbered after a deletion.
pub fn delete_task(path: &Path, id: &str) -> Result<Task, AppError> {
    let id = parse_id(id)?;

    let mut tasks = json_store::load_tasks(path)?;
    let index = tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or_else(|| AppError::not_found(format!("no task with id {id}")))?;

    let removed = tasks.remove(index);
    json_store::save_tasks(path, &tasks)?;

    Ok(removed)
}

pub fn set_status(path: &Path, id: &str, status: &str) -> Result<Task, AppError> {
    let id = parse_id(id)?;
    let status = parse_status(status)?;

    let mut tasks = json_store::load_tasks(path)?;
    let mut updated_task = None;

    for task in &mut tasks {
        if task.id == id {
            task.status = status;
            task.updated_at = Some(now_rfc3339()?);
            updated_task = Some(task.clone());
            break;
        }
    }

    let updated = updated_task.ok_or_else(|| AppError::not_found(format!("no task with id {id}")))?;
    json_store::save_tasks(path, &tasks)?;

    Ok(updated)
}

pub fn list_tasks(path: &Path, filter: Option<&str>) -> Result<Vec<Task>, AppError> {
    let filter = match filter {
        Some(raw) => Some(parse_status(raw)?),
        None => None,
    };

    let tasks = json_store::load_tasks(path)?;
    Ok(match filter {
        Some(status) => tasks
            .into_iter()
            .filter(|task| task.status == status)
            .collect(),
        None => tasks,
    })
}

pub fn get_task(path: &Path, id: &str) -> Result<Task, AppError> {
    let id = parse_id(id)?;

    let tasks = json_store::load_tasks(path)?;
    tasks
        .into_iter()
        .find(|task| task.id == id)
        .ok_or_else(|| AppError::not_found(format!("no task with id {id}")))
}

// Assigned as max existing id + 1 so a deleted id is never handed out again
// while a higher id survives. Length-based assignment would collide.
fn next_id(tasks: &[Task]) -> u64 {
    tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1
}

fn parse_id(raw: &str) -> Result<u64, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }

    let id: u64 = trimmed
        .parse()
        .map_err(|_| AppError::invalid_input("id must be a positive integer"))?;
    if id == 0 {
        return Err(AppError::invalid_input("id must be a positive integer"));
    }

    Ok(id)
}

fn parse_status(raw: &str) -> Result<TaskStatus, AppError> {
    TaskStatus::parse(raw).ok_or_else(|| {
        AppError::invalid_input(format!(
            "unknown status '{}', expected todo, in-progress or done",
            raw.trim()
        ))
    })
}

fn now_rfc3339() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}
