use std::path::Path;

use cli_table::format::{Justify, Separator};
use cli_table::{Cell, CellStruct, Color, ColorChoice, Style, Table, TableStruct, print_stdout};
use colored::Colorize;

use execvnode::release::{HostReleaseStatus, JobState, JobSubstate};
use execvnode::{AccountingRecord, ExecVnodeAssignment, HostMap, JobProjection, SelectSpec};

use crate::client::output::outputs::Output;
use crate::server::job::{Job, Released};
use crate::server::state::State;

pub struct CliOutput {
    color_policy: ColorChoice,
}

impl CliOutput {
    pub fn new(color_policy: ColorChoice) -> CliOutput {
        CliOutput { color_policy }
    }

    fn print_vertical_table(&self, rows: Vec<Vec<CellStruct>>) {
        let table = rows.table().separator(
            Separator::builder()
                .column(Some(Default::default()))
                .build(),
        );
        self.print_table(table);
    }

    fn print_horizontal_table(&self, rows: Vec<Vec<CellStruct>>, header: Vec<CellStruct>) {
        let table = rows
            .table()
            .separator(
                Separator::builder()
                    .title(Some(Default::default()))
                    .column(Some(Default::default()))
                    .build(),
            )
            .title(header);
        self.print_table(table);
    }

    fn print_table(&self, table: TableStruct) {
        let table = table.color_choice(self.color_policy);
        if let Err(e) = print_stdout(table) {
            log::error!("Cannot print table to stdout: {e:?}");
        }
    }

    fn projection_rows(&self, rows: &mut Vec<Vec<CellStruct>>, projection: &JobProjection) {
        rows.push(vec![
            "exec_vnode".cell().bold(true),
            projection.exec_vnode.as_str().cell(),
        ]);
        rows.push(vec![
            "exec_host".cell().bold(true),
            projection.exec_host.as_str().cell(),
        ]);
        for (name, value) in projection.resource_list() {
            rows.push(vec![format!("Resource_List.{name}").cell().bold(true), value.cell()]);
        }
    }
}

impl Output for CliOutput {
    fn print_assignment(&self, assignment: &ExecVnodeAssignment, hosts: &HostMap) {
        let mut rows = Vec::new();
        self.projection_rows(&mut rows, &JobProjection::of(assignment, hosts));
        self.print_vertical_table(rows);

        let rows: Vec<_> = assignment
            .chunks()
            .iter()
            .enumerate()
            .flat_map(|(index, chunk)| {
                chunk.vnodes().iter().map(move |vnode| {
                    vec![
                        index.cell().justify(Justify::Right),
                        vnode.name().cell(),
                        hosts.host_of(vnode.name()).cell(),
                        vnode.resources().to_string().cell(),
                    ]
                })
            })
            .collect();
        let header = vec![
            "Chunk".cell().bold(true),
            "Vnode".cell().bold(true),
            "Host".cell().bold(true),
            "Resources".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);
    }

    fn print_select(&self, select: &SelectSpec) {
        let rows: Vec<_> = select
            .chunks()
            .iter()
            .map(|chunk| {
                vec![
                    chunk.count().cell().justify(Justify::Right),
                    chunk.resources().to_string().cell(),
                ]
            })
            .collect();
        let header = vec!["Count".cell().bold(true), "Resources".cell().bold(true)];
        self.print_horizontal_table(rows, header);
        println!("{} {select}", "Select:".bold());
    }

    fn print_job_list(&self, jobs: Vec<(&str, &Job)>) {
        let rows: Vec<_> = jobs
            .into_iter()
            .map(|(id, job)| {
                vec![
                    id.cell(),
                    job.queue.as_str().cell(),
                    job_state_cell(job),
                    job.exec_vnode.nodect().cell().justify(Justify::Right),
                    job.exec_vnode.total_resources().ncpus().cell().justify(Justify::Right),
                ]
            })
            .collect();
        let header = vec![
            "Id".cell().bold(true),
            "Queue".cell().bold(true),
            "State".cell().bold(true),
            "Nodes".cell().bold(true),
            "Cpus".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);
    }

    fn print_job_detail(&self, job_id: &str, job: &Job, hosts: &HostMap) {
        let mut rows = vec![
            vec!["Id".cell().bold(true), job_id.cell()],
            vec!["Queue".cell().bold(true), job.queue.as_str().cell()],
            vec!["State".cell().bold(true), job_state_cell(job)],
            vec![
                "Tolerates node failures".cell().bold(true),
                if job.tolerate_node_failures { "yes" } else { "no" }.cell(),
            ],
        ];
        if let Some(select) = &job.select {
            rows.push(vec!["Select".cell().bold(true), select.to_string().cell()]);
        }
        self.projection_rows(&mut rows, &job.projection(hosts));
        for (name, value) in &job.extra_resources {
            rows.push(vec![
                format!("Resource_List.{name}").cell().bold(true),
                value.as_str().cell(),
            ]);
        }
        if job.has_released_nodes() {
            rows.push(vec![
                "Original exec_vnode".cell().bold(true),
                job.original_exec_vnode.to_string().cell(),
            ]);
        }
        self.print_vertical_table(rows);
    }

    fn print_release(&self, job_id: &str, released: &Released) {
        let result = &released.result;
        if result.is_noop() {
            println!("Job {job_id}: {}", "nothing to release".yellow());
            return;
        }
        let rows = vec![
            vec!["Job".cell().bold(true), job_id.cell()],
            vec![
                "Released vnodes".cell().bold(true),
                result.released_vnodes.join(", ").cell(),
            ],
            vec![
                "Released resources".cell().bold(true),
                result.resource_delta.to_string().cell(),
            ],
            vec![
                "exec_vnode".cell().bold(true),
                result.assignment.to_string().cell(),
            ],
            vec![
                "nodect".cell().bold(true),
                result.assignment.nodect().cell(),
            ],
        ];
        self.print_vertical_table(rows);

        let rows: Vec<_> = result
            .hosts
            .iter()
            .map(|status| vec![status.host.as_str().cell(), host_status_cell(status.status)])
            .collect();
        let header = vec!["Host".cell().bold(true), "Status".cell().bold(true)];
        self.print_horizontal_table(rows, header);
    }

    fn print_records(&self, job_id: &str, records: &[AccountingRecord]) {
        for record in records {
            println!("{};{job_id};{record}", record.kind.to_string().bold());
        }
    }

    fn print_vnode_list(&self, state: &State) {
        let rows: Vec<_> = state
            .vnodes
            .iter()
            .map(|(name, vnode)| {
                vec![
                    name.as_str().cell(),
                    vnode.host.as_str().cell(),
                    if vnode.cray { "yes" } else { "no" }.cell(),
                ]
            })
            .collect();
        let header = vec![
            "Vnode".cell().bold(true),
            "Host".cell().bold(true),
            "Cray".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);
    }

    fn print_server_info(&self, state_path: &Path, state: &State) {
        let running = state
            .jobs
            .values()
            .filter(|job| job.state == JobState::Running)
            .count();
        let mut rows = vec![
            vec![
                "State file".cell().bold(true),
                state_path.display().to_string().cell(),
            ],
            vec![
                "resources_assigned".cell().bold(true),
                state.resources_assigned.to_string().cell(),
            ],
            vec!["Vnodes".cell().bold(true), state.vnodes.len().cell()],
            vec![
                "Jobs".cell().bold(true),
                format!("{} ({running} running)", state.jobs.len()).cell(),
            ],
        ];
        for (name, queue) in &state.queues {
            rows.push(vec![
                format!("Queue {name}").cell().bold(true),
                queue.resources_assigned.to_string().cell(),
            ]);
        }
        self.print_vertical_table(rows);
    }

    fn print_error(&self, error: anyhow::Error) {
        eprintln!("{error:?}");
    }
}

fn job_state_cell(job: &Job) -> CellStruct {
    match (job.state, job.substate) {
        (JobState::Running, JobSubstate::Prerun) => {
            "PRERUN".cell().foreground_color(Some(Color::Cyan))
        }
        (JobState::Running, _) => "RUNNING".cell().foreground_color(Some(Color::Yellow)),
        (JobState::Finished, _) => "FINISHED".cell().foreground_color(Some(Color::Green)),
        (state, _) => state.to_string().cell(),
    }
}

fn host_status_cell(status: HostReleaseStatus) -> CellStruct {
    let color = match status {
        HostReleaseStatus::FullyReleased => Color::Green,
        HostReleaseStatus::PartiallyReleased => Color::Yellow,
        HostReleaseStatus::Unchanged => Color::White,
    };
    status.to_string().cell().foreground_color(Some(color))
}
