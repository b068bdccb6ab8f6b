use skillet_skills::SkillRegistry;

use super::SkillAction;

pub(super) fn cmd_skills(
    config: skillet_config::SkilletConfig,
    action: SkillAction,
) -> skillet_core::Result<()> {
    let skills_dir = &config.skills.dir;
    let registry = SkillRegistry::discover_in(skills_dir)?;

    match action {
        SkillAction::List => {
            if registry.is_empty() {
                println!("No skills found in {}", skills_dir.display());
                println!("  Create one with a SKILL.md in {}/<id>/", skills_dir.display());
                return Ok(());
            }
            println!("\x1b[1mAvailable Skills ({}):\x1b[0m\n", registry.count());
            for id in registry.list_skills() {
                match registry.definition(&id) {
                    Ok(skill) => {
                        let version = skill.version.map(|v| format!(" v{v}")).unwrap_or_default();
                        let tags = if skill.tags.is_empty() {
                            String::new()
                        } else {
                            format!(" [{}]", skill.tags.join(", "))
                        };
                        println!("  \x1b[36m{id}\x1b[0m  {}{version}{tags}", skill.name);
                        println!("    {}", skill.description);
                        println!("    File: {}", skill.file_path.display());
                    }
                    Err(e) => println!("  \x1b[31m{id}\x1b[0m  (failed to load: {e})"),
                }
                println!();
            }
        }
        SkillAction::Show { id, file } => {
            if !registry.contains(&id) {
                println!("{}", registry.load_skill(&id, &file));
                return Ok(());
            }
            if file == skillet_skills::registry::SKILL_FILE {
                let skill = registry.definition(&id)?;
                println!("\x1b[1m{}\x1b[0m ({id})", skill.name);
                println!("  {}", skill.description);
                if let Some(ref author) = skill.author {
                    println!("  Author: {author}");
                }
                println!("  File: {}\n", skill.file_path.display());
            }
            println!("{}", registry.load_skill(&id, &file));
        }
    }
    Ok(())
}
