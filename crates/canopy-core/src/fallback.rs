//! Deterministic project ideas served when the model cannot be used.

use crate::models::{GenerationResult, ProjectIdea};

/// A catalog entry for one well-known role.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub role: &'static str,
    pub insights: [&'static str; 5],
    pub projects: [CatalogProject; 3],
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogProject {
    pub title: &'static str,
    pub description: &'static str,
    pub tech_stack: &'static [&'static str],
    pub tasks: [&'static str; 5],
    pub difficulty: u8,
}

impl CatalogProject {
    fn to_idea(self) -> ProjectIdea {
        ProjectIdea {
            title: self.title.to_string(),
            description: self.description.to_string(),
            tech_stack: self.tech_stack.iter().map(|s| s.to_string()).collect(),
            tasks: self.tasks.iter().map(|s| s.to_string()).collect(),
            difficulty: self.difficulty,
        }
    }
}

/// Fallback chosen for a job title.
#[derive(Debug, Clone)]
pub enum FallbackEntry {
    /// The title matches a catalog role.
    Catalog(&'static CatalogEntry),
    /// Any other title, substituted into fixed templates.
    Generic { job_title: String },
}

impl FallbackEntry {
    /// Look up `job_title` case-insensitively, ignoring surrounding space.
    pub fn resolve(job_title: &str) -> Self {
        let key = job_title.trim().to_lowercase();
        match CATALOG.iter().find(|entry| entry.role == key) {
            Some(entry) => FallbackEntry::Catalog(entry),
            None => FallbackEntry::Generic {
                job_title: job_title.trim().to_string(),
            },
        }
    }

    pub fn into_result(self) -> GenerationResult {
        match self {
            FallbackEntry::Catalog(entry) => GenerationResult {
                insights: entry.insights.iter().map(|s| s.to_string()).collect(),
                projects: entry.projects.iter().map(|p| p.to_idea()).collect(),
            },
            FallbackEntry::Generic { job_title } => generic(&job_title),
        }
    }
}

/// Fallback result for `job_title`.
pub fn fallback_for(job_title: &str) -> GenerationResult {
    FallbackEntry::resolve(job_title).into_result()
}

fn generic(job_title: &str) -> GenerationResult {
    let project = |title: String, description: &str, stack: &[&str], tasks: [&str; 5], difficulty| {
        ProjectIdea {
            title,
            description: description.to_string(),
            tech_stack: stack.iter().map(|s| s.to_string()).collect(),
            tasks: tasks.iter().map(|s| s.to_string()).collect(),
            difficulty,
        }
    };

    GenerationResult {
        insights: [
            "Problem Solving",
            "Modern Technologies",
            "Best Practices",
            "User Experience",
            "Performance",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        projects: vec![
            project(
                format!("Portfolio Website for {job_title}"),
                "A professional portfolio presenting your skills, projects and experience, \
                 with a responsive layout, good performance and a modern build pipeline.",
                &["HTML5", "CSS3", "JavaScript", "Git", "Static hosting"],
                [
                    "Set up the repository and project structure",
                    "Design a responsive layout",
                    "Write up each showcased project",
                    "Tune performance and accessibility",
                    "Deploy to production",
                ],
                2,
            ),
            project(
                format!("Industry-Specific Tool for {job_title}"),
                "A focused tool that solves a common problem in your industry, showing domain \
                 knowledge alongside practical engineering.",
                &["Web framework", "Database", "API integration", "Testing"],
                [
                    "Write the problem statement and requirements",
                    "Design the system architecture",
                    "Implement the core features",
                    "Add tests and error handling",
                    "Deploy and document the API",
                ],
                3,
            ),
            project(
                format!("Automation Solution for {job_title}"),
                "An automation tool that removes repetitive work from everyday tasks in your \
                 field, showing an efficiency mindset and problem-solving ability.",
                &["Scripting language", "APIs", "Scheduling", "Monitoring"],
                [
                    "Identify tasks worth automating",
                    "Design the workflow and data handling",
                    "Implement the automation scripts",
                    "Add monitoring and error handling",
                    "Write deployment scripts",
                ],
                3,
            ),
        ],
    }
}

pub static CATALOG: [CatalogEntry; 4] = [
    CatalogEntry {
        role: "full stack developer",
        insights: [
            "React/Vue.js",
            "Node.js/Express",
            "Database Design",
            "API Development",
            "Cloud Deployment",
        ],
        projects: [
            CatalogProject {
                title: "E-Commerce Platform with Real-time Features",
                description: "A complete store with authentication, payments, inventory \
                              management and live notifications, covering both business logic \
                              and the full web stack.",
                tech_stack: &["React", "Node.js", "MongoDB", "Stripe API", "Socket.io"],
                tasks: [
                    "Model products, orders and users",
                    "Build the catalogue and cart UI",
                    "Integrate payments",
                    "Push live stock and order notifications",
                    "Containerize and deploy",
                ],
                difficulty: 4,
            },
            CatalogProject {
                title: "Social Media Dashboard with Analytics",
                description: "A dashboard that aggregates posts across networks, tracks \
                              engagement and charts trends, showing API integration and data \
                              visualization.",
                tech_stack: &["Vue.js", "Express.js", "PostgreSQL", "Chart.js", "Redis"],
                tasks: [
                    "Connect to two social network APIs",
                    "Store posts and metrics",
                    "Cache hot queries",
                    "Build engagement charts",
                    "Add scheduled refresh and alerts",
                ],
                difficulty: 3,
            },
            CatalogProject {
                title: "Real-time Collaboration Tool",
                description: "A team workspace with live messaging, file sharing and team \
                              management, showing real-time architecture and scalability.",
                tech_stack: &["React", "Node.js", "WebSocket", "AWS S3", "Docker"],
                tasks: [
                    "Design channels, members and messages",
                    "Implement WebSocket messaging",
                    "Add file uploads to object storage",
                    "Build team and permission management",
                    "Load test and deploy",
                ],
                difficulty: 4,
            },
        ],
    },
    CatalogEntry {
        role: "data scientist",
        insights: [
            "Python/R",
            "Machine Learning",
            "Data Visualization",
            "SQL/NoSQL",
            "Cloud Platforms",
        ],
        projects: [
            CatalogProject {
                title: "Predictive Analytics for Business Forecasting",
                description: "Models that forecast sales, churn or market trends from \
                              historical data, served as a REST API for business use.",
                tech_stack: &["Python", "Scikit-learn", "Pandas", "Flask", "AWS"],
                tasks: [
                    "Collect and clean a historical dataset",
                    "Engineer features and baselines",
                    "Train and evaluate models",
                    "Serve predictions over REST",
                    "Deploy and monitor drift",
                ],
                difficulty: 4,
            },
            CatalogProject {
                title: "Real-time Sentiment Analysis System",
                description: "A pipeline that scores social media sentiment as it streams in, \
                              for brand monitoring, showing NLP and stream processing.",
                tech_stack: &["Python", "NLTK", "Kafka", "MongoDB", "Docker"],
                tasks: [
                    "Ingest a live post stream",
                    "Build the sentiment classifier",
                    "Score messages from Kafka",
                    "Store and aggregate scores",
                    "Alert on sentiment shifts",
                ],
                difficulty: 4,
            },
            CatalogProject {
                title: "Interactive Data Visualization Dashboard",
                description: "A dashboard that turns complex datasets into interactive views \
                              for stakeholder decisions.",
                tech_stack: &["Python", "Plotly", "Streamlit", "PostgreSQL", "Heroku"],
                tasks: [
                    "Pick and load a public dataset",
                    "Design the key metrics",
                    "Build interactive charts",
                    "Add filters and drill-downs",
                    "Publish the dashboard",
                ],
                difficulty: 2,
            },
        ],
    },
    CatalogEntry {
        role: "frontend developer",
        insights: [
            "React/TypeScript",
            "Responsive Design",
            "Accessibility",
            "State Management",
            "Web Performance",
        ],
        projects: [
            CatalogProject {
                title: "Accessible Component Library",
                description: "A themeable UI component library with documented accessibility \
                              guarantees and visual regression tests.",
                tech_stack: &["React", "TypeScript", "Storybook", "Jest"],
                tasks: [
                    "Define design tokens and theming",
                    "Build core form and layout components",
                    "Audit keyboard and screen reader support",
                    "Document components in Storybook",
                    "Publish the package",
                ],
                difficulty: 3,
            },
            CatalogProject {
                title: "Offline-first Task Planner",
                description: "A progressive web app that keeps working offline and syncs when \
                              the connection returns.",
                tech_stack: &["Vue.js", "TypeScript", "IndexedDB", "Service Workers"],
                tasks: [
                    "Design the task model",
                    "Build the planner views",
                    "Persist data in IndexedDB",
                    "Add background sync",
                    "Score the app with Lighthouse and fix findings",
                ],
                difficulty: 3,
            },
            CatalogProject {
                title: "Real-time Market Data Visualizer",
                description: "Streaming charts over live market data with smooth rendering \
                              under heavy update rates.",
                tech_stack: &["React", "D3.js", "WebSocket", "Web Workers"],
                tasks: [
                    "Connect to a public data stream",
                    "Buffer updates in a worker",
                    "Render charts with D3",
                    "Profile and remove jank",
                    "Deploy with a CDN",
                ],
                difficulty: 4,
            },
        ],
    },
    CatalogEntry {
        role: "backend developer",
        insights: [
            "API Design",
            "Databases",
            "Caching",
            "Message Queues",
            "Cloud Infrastructure",
        ],
        projects: [
            CatalogProject {
                title: "URL Shortener with Analytics",
                description: "A high-throughput link shortener recording click analytics, \
                              showing data modelling, caching and API design.",
                tech_stack: &["Go", "PostgreSQL", "Redis", "Docker"],
                tasks: [
                    "Design the link and click schema",
                    "Implement create and redirect endpoints",
                    "Cache hot links",
                    "Aggregate click analytics",
                    "Load test and deploy",
                ],
                difficulty: 2,
            },
            CatalogProject {
                title: "Event-driven Order Processing Service",
                description: "An order pipeline split into services that communicate through a \
                              message broker, with retries and idempotency.",
                tech_stack: &["Java", "Spring Boot", "Kafka", "MySQL", "Kubernetes"],
                tasks: [
                    "Model the order lifecycle",
                    "Publish and consume order events",
                    "Make handlers idempotent",
                    "Add retries and dead-letter handling",
                    "Deploy to Kubernetes",
                ],
                difficulty: 4,
            },
            CatalogProject {
                title: "Multi-tenant REST API Platform",
                description: "A SaaS-style API with tenant isolation, rate limiting and \
                              OpenAPI documentation.",
                tech_stack: &["Node.js", "TypeScript", "PostgreSQL", "Redis", "AWS"],
                tasks: [
                    "Design tenant isolation",
                    "Implement authentication",
                    "Add per-tenant rate limiting",
                    "Generate OpenAPI documentation",
                    "Set up CI and deployment",
                ],
                difficulty: 3,
            },
        ],
    },
];
