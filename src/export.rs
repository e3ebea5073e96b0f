use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::archive::SavedMatch;
use crate::rally::{Outcome, Team};
use crate::roster::{PlayerId, Roster};

pub struct ExportReport {
    pub sets: usize,
    pub rallies: usize,
    pub substitutions: usize,
    pub score_events: usize,
}

/// Writes one saved match to an `.xlsx` workbook.
pub fn export_saved_match_xlsx(
    saved: &SavedMatch,
    roster: &Roster,
    path: &Path,
) -> Result<ExportReport> {
    let summary_rows = summary_rows(saved);
    let stats_rows = statistics_rows(saved);
    let set_rows = set_rows(saved);
    let sub_rows = substitution_rows(saved, roster);
    let log_rows = score_log_rows(saved);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Statistics")?;
        write_rows(sheet, &stats_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Sets")?;
        write_rows(sheet, &set_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Substitutions")?;
        write_rows(sheet, &sub_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("ScoreLog")?;
        write_rows(sheet, &log_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        sets: saved.per_set_logs.len(),
        rallies: set_rows.len().saturating_sub(1),
        substitutions: sub_rows.len().saturating_sub(1),
        score_events: log_rows.len().saturating_sub(1),
    })
}

fn summary_rows(saved: &SavedMatch) -> Vec<Vec<String>> {
    let mut rows = vec![
        vec!["Opponent".to_string(), saved.opponent.clone()],
        vec!["Date".to_string(), saved.date.format("%Y-%m-%d").to_string()],
        vec![
            "Sets".to_string(),
            format!("{}-{}", saved.final_score.home, saved.final_score.away),
        ],
        vec!["Winner".to_string(), saved.winner.label().to_string()],
        Vec::new(),
        vec![
            "Set".to_string(),
            "Home".to_string(),
            "Away".to_string(),
            "Winner".to_string(),
        ],
    ];
    for set in &saved.per_set_logs {
        rows.push(vec![
            set.set_number.to_string(),
            set.final_score.home.to_string(),
            set.final_score.away.to_string(),
            set.winner.label().to_string(),
        ]);
    }
    rows
}

fn statistics_rows(saved: &SavedMatch) -> Vec<Vec<String>> {
    let home = saved.statistics.get(Team::Home).rows();
    let away = saved.statistics.get(Team::Away).rows();
    let mut rows = vec![vec![
        "Point type".to_string(),
        "Home".to_string(),
        "Away".to_string(),
    ]];
    for ((label, h), (_, a)) in home.iter().zip(away.iter()) {
        rows.push(vec![label.to_string(), h.to_string(), a.to_string()]);
    }
    rows.push(vec![
        "Total".to_string(),
        saved.points_for(Team::Home).to_string(),
        saved.points_for(Team::Away).to_string(),
    ]);
    rows
}

fn set_rows(saved: &SavedMatch) -> Vec<Vec<String>> {
    let mut rows = vec![header(&["Set", "Rally", "Team", "Outcome", "Fault", "X", "Y"])];
    for set in &saved.per_set_logs {
        for (idx, rally) in set.rallies.iter().enumerate() {
            rows.push(vec![
                set.set_number.to_string(),
                (idx + 1).to_string(),
                rally.team.label().to_string(),
                rally.outcome.label().to_string(),
                fault_label(rally.outcome),
                format!("{:.1}", rally.at.x()),
                format!("{:.1}", rally.at.y()),
            ]);
        }
    }
    rows
}

fn substitution_rows(saved: &SavedMatch, roster: &Roster) -> Vec<Vec<String>> {
    let mut rows = vec![header(&["Set", "Team", "Out", "In"])];
    for entry in &saved.substitutions {
        rows.push(vec![
            entry.set_number.to_string(),
            entry.team.label().to_string(),
            player_label(roster, entry.team, entry.player_out),
            player_label(roster, entry.team, entry.player_in),
        ]);
    }
    rows
}

fn score_log_rows(saved: &SavedMatch) -> Vec<Vec<String>> {
    let mut rows = vec![header(&["Set", "Score", "Team", "Outcome", "Fault"])];
    for event in &saved.score_event_log {
        rows.push(vec![
            event.set_number.to_string(),
            event.score_label(),
            event.team.label().to_string(),
            event.outcome.label().to_string(),
            fault_label(event.outcome),
        ]);
    }
    rows
}

fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn fault_label(outcome: Outcome) -> String {
    outcome
        .fault()
        .map(|kind| kind.label().to_string())
        .unwrap_or_default()
}

// Opponent players have no roster entries.
fn player_label(roster: &Roster, team: Team, id: PlayerId) -> String {
    match team {
        Team::Home => roster.display_name(id),
        Team::Away => format!("#{id}"),
    }
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
