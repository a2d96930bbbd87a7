use serde::Serialize;

/// Fixed strategic-plan reference hierarchy. Read-only; departments report
/// against it but never mutate it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Department {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Goal {
    pub id: &'static str,
    pub code: &'static str,
    pub title: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub id: &'static str,
    pub goal_id: &'static str,
    pub code: &'static str,
    pub title: &'static str,
}

pub const DEPARTMENTS: &[Department] = &[
    Department { id: "dept-1", name: "Business Communications Unit" },
    Department { id: "dept-2", name: "Department of Accounting" },
    Department { id: "dept-3", name: "Department of Business Administration" },
    Department { id: "dept-4", name: "Department of Business Economics" },
    Department { id: "dept-5", name: "Department of Commerce" },
    Department { id: "dept-6", name: "Department of Decision Sciences" },
    Department { id: "dept-7", name: "Department of Entrepreneurship" },
    Department { id: "dept-8", name: "Department of Estate Management and Valuation" },
    Department { id: "dept-9", name: "Department of Finance" },
    Department { id: "dept-10", name: "Department of Human Resource Management" },
    Department { id: "dept-11", name: "Department of Information Technology" },
    Department { id: "dept-12", name: "Department of Marketing" },
    Department { id: "dept-13", name: "Department of Public Administration" },
    Department { id: "dept-14", name: "Legal Studies Unit" },
];

pub const GOALS: &[Goal] = &[
    Goal { id: "goal-1", code: "1", title: "Academic Excellence" },
    Goal { id: "goal-2", code: "2", title: "Research, Innovation and Partnerships" },
    Goal { id: "goal-3", code: "3", title: "Human Capital Development" },
    Goal { id: "goal-4", code: "4", title: "Infrastructure & Digital Transformation" },
    Goal { id: "goal-5", code: "5", title: "Financial Resilience" },
    Goal { id: "goal-6", code: "6", title: "Outstanding Student Experience" },
    Goal { id: "goal-7", code: "7", title: "National Development, Global Presence and Sustainability" },
];

pub const OBJECTIVES: &[Objective] = &[
    Objective { id: "obj-1-1", goal_id: "goal-1", code: "1.1", title: "Expand Accessibility to higher education" },
    Objective { id: "obj-1-2", goal_id: "goal-1", code: "1.2", title: "Enhance the quality and relevance of academic programs" },
    Objective { id: "obj-1-3", goal_id: "goal-1", code: "1.3", title: "Encourage more learner-centered active learning through improved delivery and assessment methods" },
    Objective { id: "obj-1-4", goal_id: "goal-1", code: "1.4", title: "Develop and implement formal feedback mechanisms to support informed decision making and ensure timely corrective and developmental actions" },
    Objective { id: "obj-2-1", goal_id: "goal-2", code: "2.1", title: "Strengthen staff research output and impact" },
    Objective { id: "obj-2-2", goal_id: "goal-2", code: "2.2", title: "Strengthen student research output and impact" },
    Objective { id: "obj-2-3", goal_id: "goal-2", code: "2.3", title: "Expand industry networks and partnerships to improve research culture" },
    Objective { id: "obj-3-1", goal_id: "goal-3", code: "3.1", title: "Recruit and Retain high Caliber Staff" },
    Objective { id: "obj-3-2", goal_id: "goal-3", code: "3.2", title: "Develop high caliber staff" },
    Objective { id: "obj-3-3", goal_id: "goal-3", code: "3.3", title: "Promote balanced workload" },
    Objective { id: "obj-3-4", goal_id: "goal-3", code: "3.4", title: "Strengthen the non-academic and supporting staff" },
    Objective { id: "obj-3-5", goal_id: "goal-3", code: "3.5", title: "Promote continuous development of non-academic staff" },
    Objective { id: "obj-3-6", goal_id: "goal-3", code: "3.6", title: "Create supportive departmental culture that emphasizes teamwork, knowledge sharing and work-life balance" },
    Objective { id: "obj-4-1", goal_id: "goal-4", code: "4.1", title: "Ensure adequate physical and technological infrastructure at disposal" },
    Objective { id: "obj-4-2", goal_id: "goal-4", code: "4.2", title: "Maintain and regularly upgrade digital infrastructure" },
    Objective { id: "obj-4-3", goal_id: "goal-4", code: "4.3", title: "Enhance the functionality and accessibility of the Department's digital platforms (website, LMS, online resource-sharing systems) to support students, staff, and stakeholders" },
    Objective { id: "obj-4-4", goal_id: "goal-4", code: "4.4", title: "Introduce incremental improvements in departmental digitalization to improve administrative and academic workflows" },
    Objective { id: "obj-4-5", goal_id: "goal-4", code: "4.5", title: "Ensure timely technical support and preventive maintenance for departmental facilities to minimize disruptions" },
    Objective { id: "obj-4-6", goal_id: "goal-4", code: "4.6", title: "Develop workspaces to ensure a smooth and calm academic environment within departments" },
    Objective { id: "obj-5-1", goal_id: "goal-5", code: "5.1", title: "Enhance and diversify revenue streams" },
    Objective { id: "obj-5-2", goal_id: "goal-5", code: "5.2", title: "Attract, manage, and account for self-generated funds through executive education and consultancy services" },
    Objective { id: "obj-5-3", goal_id: "goal-5", code: "5.3", title: "Strengthen collaboration with alumni, corporations, and development partners to secure sponsorships and endowments for departmental activities" },
    Objective { id: "obj-5-4", goal_id: "goal-5", code: "5.4", title: "Explore partnerships with government agencies, NGOs, and international organizations for project-based or grant-funded initiatives aligned with departmental expertise" },
    Objective { id: "obj-5-5", goal_id: "goal-5", code: "5.5", title: "Strengthen financial planning and revenue utilization" },
    Objective { id: "obj-6-1", goal_id: "goal-6", code: "6.1", title: "Enhance Global Exposure for students" },
    Objective { id: "obj-6-2", goal_id: "goal-6", code: "6.2", title: "Develop graduates with a balanced skill pool and enhance their employability skills" },
    Objective { id: "obj-6-3", goal_id: "goal-6", code: "6.3", title: "Support Students' Professional Development and encourage them to pursue higher education" },
    Objective { id: "obj-6-4", goal_id: "goal-6", code: "6.4", title: "Strengthen student support" },
    Objective { id: "obj-6-5", goal_id: "goal-6", code: "6.5", title: "Strengthen Alumni Associations and get its involvement in students' activities and Provide support for Alumni members" },
    Objective { id: "obj-6-6", goal_id: "goal-6", code: "6.6", title: "Encourage lifelong learning by cultivating curiosity, adaptability, and continuous self-development among students" },
    Objective { id: "obj-6-7", goal_id: "goal-6", code: "6.7", title: "Promote holistic growth while strengthening staff-student relationships" },
    Objective { id: "obj-7-1", goal_id: "goal-7", code: "7.1", title: "Ensure all the programmes and the department initiatives are directed towards promoting responsible management education" },
    Objective { id: "obj-7-2", goal_id: "goal-7", code: "7.2", title: "Promote social responsibility and community engagement to address local challenges" },
    Objective { id: "obj-7-3", goal_id: "goal-7", code: "7.3", title: "Enhance the department's global visibility and presence" },
    Objective { id: "obj-7-4", goal_id: "goal-7", code: "7.4", title: "Build partnerships with regional and international stakeholders to expand reach and influence" },
    Objective { id: "obj-7-5", goal_id: "goal-7", code: "7.5", title: "Strengthen Institutional Platforms and Networks" },
];

pub fn department(id: &str) -> Option<&'static Department> {
    DEPARTMENTS.iter().find(|d| d.id == id)
}

pub fn goal(id: &str) -> Option<&'static Goal> {
    GOALS.iter().find(|g| g.id == id)
}

pub fn objective(id: &str) -> Option<&'static Objective> {
    OBJECTIVES.iter().find(|o| o.id == id)
}

pub fn objectives_for_goal(goal_id: &str) -> Vec<&'static Objective> {
    OBJECTIVES.iter().filter(|o| o.goal_id == goal_id).collect()
}

/// Parent goal of an objective, or None for an id outside the catalog.
pub fn goal_for_objective(objective_id: &str) -> Option<&'static Goal> {
    objective(objective_id).and_then(|o| goal(o.goal_id))
}

/// Case-insensitive match on objective code or title, scoped to a goal when
/// given. Mirrors the entry screen's search box.
pub fn search_objectives(goal_id: Option<&str>, term: &str) -> Vec<&'static Objective> {
    let needle = term.to_lowercase();
    OBJECTIVES
        .iter()
        .filter(|o| goal_id.map(|g| o.goal_id == g).unwrap_or(true))
        .filter(|o| {
            needle.is_empty()
                || o.code.contains(&needle)
                || o.title.to_lowercase().contains(&needle)
        })
        .collect()
}
