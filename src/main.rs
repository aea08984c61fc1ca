use std::error::Error;

use dclass::prelude::*;

fn check(file: &DcFile, root: Node, value: DcValue) -> Result<(), Box<dyn Error>> {
    let bytes = pack_to_vec(file, root, &value)?;
    assert_eq!(unpack_to_value(file, root, &bytes)?, value);
    println!(
        "{:<40} {}",
        format_data(file, root, &bytes, true)?,
        bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut file = DcFile::with_config(DcConfig::from_env());
    let avatar = file.add_class("DistributedAvatar", false)?;

    let name = file.new_parameter_field("name", SimpleParameter::new(SubatomicType::String).into());
    let set_name = file.new_atomic_field("setName", vec![name])?;
    file.add_field_keyword(set_name, "required")?;
    file.add_field_keyword(set_name, "broadcast")?;
    file.add_field(avatar, set_name)?;

    let mut hp = SimpleParameter::new(SubatomicType::Int16);
    hp.set_range(NumericRange::single(0.0, 137.0)?)?;
    let hp = file.new_parameter_field("hp", hp.into());
    let mut speed = SimpleParameter::new(SubatomicType::UInt16);
    speed.set_divisor(100)?;
    let speed = file.new_parameter_field("speed", speed.into());
    let set_stats = file.new_atomic_field("setStats", vec![hp, speed])?;
    file.add_field_keyword(set_stats, "ram")?;
    file.add_field(avatar, set_stats)?;

    print!("{file}");
    println!("// hash {:#010x}", file.generate_hash());
    println!();

    check(&file, Node::Field(set_name), DcValue::List(vec!["Flippy".into()]))?;
    check(
        &file,
        Node::Field(set_stats),
        DcValue::List(vec![DcValue::Int(100), DcValue::Float(1.25)]),
    )?;
    Ok(())
}
